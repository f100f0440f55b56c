//! Firmware audit, ITSM audit and approval tools.

use super::inventory::{
    ApprovalTicket, ChangeItem, Device, InventorySource, ItsmRecords, ItsmSource,
    KnowledgeBaseItem, OutageItem,
};
use runtime::{ToolCall, ToolError, ToolHost, ToolOutput, ToolSpec};
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{error, info};

pub const INTERSIGHT_TOOL: &str = "IntersightTool";
pub const ITSM_AUDIT: &str = "ITSMAudit";
pub const ITSM_APPROVAL: &str = "ITSMApproval";

const PLAN_SUMMARY_CHARS: usize = 200;

const EMPTY_DEVICES_ERROR: &str = "Error: devices_json parameter is required and cannot be empty. \
    Please pass the JSON output from FirmwareAudit tool.";
const MISSING_DEVICES_ERROR: &str =
    "Error: devices_json must contain a 'devices' key with device information";
const EMPTY_PLAN_ERROR: &str = "Error: plan parameter is required and cannot be empty";

#[derive(Serialize)]
struct Inventory<'a> {
    devices: &'a [Device],
}

/// The inventory document IntersightTool returns.
pub fn inventory_document(devices: &[Device]) -> Result<String, ToolError> {
    serde_json::to_string(&Inventory { devices })
        .map_err(|e| ToolError::Execution(format!("failed to encode inventory: {e}")))
}

#[derive(Serialize)]
struct AuditReport<'a> {
    devices: &'a RawValue,
    itsm_changemanagement_items: &'a BTreeMap<String, ChangeItem>,
    itsm_outage_items: &'a BTreeMap<String, OutageItem>,
    itsm_knowledgebase_items: &'a BTreeMap<String, KnowledgeBaseItem>,
}

fn error_payload(message: &str) -> String {
    error!("{message}");
    json!({ "error": message }).to_string()
}

/// Cross-reference an inventory document with ITSM records.
///
/// Bad input yields an `{"error": ...}` document rather than an `Err`, so the
/// model can see what went wrong and retry.
pub fn itsm_audit(devices_json: &str, records: &ItsmRecords) -> Result<String, ToolError> {
    if devices_json.trim().is_empty() {
        return Ok(error_payload(EMPTY_DEVICES_ERROR));
    }

    // Echoed back verbatim, so key order and number precision survive.
    let devices: &RawValue = match serde_json::from_str(devices_json) {
        Ok(devices) => devices,
        Err(e) => {
            return Ok(error_payload(&format!(
                "Error: Failed to parse devices_json. Invalid JSON format: {e}"
            )));
        }
    };

    let has_devices = serde_json::from_str::<serde_json::Map<String, Value>>(devices.get())
        .is_ok_and(|document| document.contains_key("devices"));
    if !has_devices {
        return Ok(error_payload(MISSING_DEVICES_ERROR));
    }

    let report = AuditReport {
        devices,
        itsm_changemanagement_items: &records.changes,
        itsm_outage_items: &records.outages,
        itsm_knowledgebase_items: &records.knowledge_base,
    };
    let document = serde_json::to_string_pretty(&report)
        .map_err(|e| ToolError::Execution(format!("failed to encode audit report: {e}")))?;
    info!("ITSM audit completed");
    Ok(document)
}

/// The first 200 characters of `plan`, with `...` when cut short.
pub fn plan_summary(plan: &str) -> String {
    let mut summary: String = plan.chars().take(PLAN_SUMMARY_CHARS).collect();
    if plan.chars().count() > PLAN_SUMMARY_CHARS {
        summary.push_str("...");
    }
    summary
}

/// Confirmation text for a submitted plan.
pub fn approval_confirmation(plan: &str, ticket: &ApprovalTicket) -> String {
    format!(
        "ITSM Approval Status: {status}
Ticket ID: {ticket_id}
Submitted At: {submitted_at}
Plan Summary: {summary}

Next Steps:
1. Approval workflow initiated
2. Technical review by network team
3. Business impact assessment
4. Final approval by change board",
        status = ticket.status,
        ticket_id = ticket.ticket_id,
        submitted_at = ticket.submitted_at.format("%Y-%m-%d %H:%M:%S"),
        summary = plan_summary(plan),
    )
}

/// IntersightTool, ITSMAudit and ITSMApproval.
pub struct NetworkTools<I, T> {
    inventory: I,
    itsm: T,
    specs: Vec<ToolSpec>,
}

/// Specs for the three network tools, in node order.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::single_string(
            INTERSIGHT_TOOL,
            "Audit network devices to find those with outdated firmware. Call this first to \
             get the device list. Returns JSON with device information including current and \
             recommended firmware versions.",
            "devices",
            "Devices to audit; any value returns the full inventory",
        ),
        ToolSpec::single_string(
            ITSM_AUDIT,
            "Generate upgrade plan with ITSM integration data. MUST be called with the exact \
             JSON output from FirmwareAudit as the devices_json parameter. Returns devices \
             along with change management, outage, and knowledge base information.",
            "devices_json",
            "JSON string containing device information from firmware audit",
        ),
        ToolSpec::single_string(
            ITSM_APPROVAL,
            "Submit the final upgrade plan for ITSM approval. Call this with the complete, \
             structured upgrade plan that includes timing, priorities, and conflict analysis.",
            "plan",
            "The complete firmware upgrade plan to submit for approval",
        ),
    ]
}

impl<I: InventorySource, T: ItsmSource> NetworkTools<I, T> {
    pub fn new(inventory: I, itsm: T) -> Self {
        Self {
            inventory,
            itsm,
            specs: tool_specs(),
        }
    }

    async fn audit_firmware(&self) -> Result<ToolOutput, ToolError> {
        let devices = self.inventory.outdated_devices().await?;
        info!(devices = devices.len(), "firmware audit");

        let hostnames = devices
            .iter()
            .map(|d| Value::String(d.hostname.clone()))
            .collect();
        Ok(ToolOutput::text(inventory_document(&devices)?)
            .with_update("devices", Value::Array(hostnames)))
    }

    async fn audit_itsm(&self, devices_json: &str) -> Result<ToolOutput, ToolError> {
        let records = self.itsm.records().await?;
        Ok(ToolOutput::text(itsm_audit(devices_json, &records)?))
    }

    async fn request_approval(&self, plan: String) -> Result<ToolOutput, ToolError> {
        if plan.trim().is_empty() {
            error!("{EMPTY_PLAN_ERROR}");
            return Ok(ToolOutput::text(EMPTY_PLAN_ERROR));
        }

        let ticket = self.itsm.submit_for_approval(&plan).await?;
        info!(ticket = %ticket.ticket_id, "upgrade plan submitted for approval");

        let content = approval_confirmation(&plan, &ticket);
        Ok(ToolOutput::text(content)
            .with_update("upgrade_plan", Value::String(plan))
            .with_update("approval_status", Value::String(ticket.status)))
    }
}

impl<I: InventorySource, T: ItsmSource> ToolHost for NetworkTools<I, T> {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        match call.name.as_str() {
            INTERSIGHT_TOOL => self.audit_firmware().await,
            ITSM_AUDIT => self.audit_itsm(&call.string_arg("devices_json")).await,
            ITSM_APPROVAL => self.request_approval(call.string_arg("plan")).await,
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{DemoInventory, DemoItsm};
    use chrono::{NaiveDate, NaiveDateTime};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tools() -> NetworkTools<DemoInventory, DemoItsm> {
        NetworkTools::new(DemoInventory, DemoItsm::at(noon()))
    }

    fn call(name: &str, param: &str, arg: &str) -> ToolCall {
        let mut input = serde_json::Map::new();
        input.insert(param.to_string(), Value::String(arg.to_string()));
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            input: Value::Object(input),
        }
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn audit_rejects_empty_input() {
        for input in ["", "   \n"] {
            let out = parse(&itsm_audit(input, &DemoItsm::demo_records()).unwrap());
            assert_eq!(out["error"], EMPTY_DEVICES_ERROR);
        }
    }

    #[test]
    fn audit_rejects_invalid_json() {
        let out = parse(&itsm_audit("{devices: nope", &DemoItsm::demo_records()).unwrap());
        let message = out["error"].as_str().unwrap();
        assert!(message.starts_with("Error: Failed to parse devices_json. Invalid JSON format:"));
    }

    #[test]
    fn audit_requires_devices_key() {
        for input in [r#"{"hosts": []}"#, r#"["devices"]"#, "42"] {
            let out = parse(&itsm_audit(input, &DemoItsm::demo_records()).unwrap());
            assert_eq!(out["error"], MISSING_DEVICES_ERROR, "input {input}");
        }
    }

    #[test]
    fn audit_combines_devices_with_itsm_records() {
        let input = inventory_document(&DemoInventory::devices()).unwrap();
        let text = itsm_audit(&input, &DemoItsm::demo_records()).unwrap();

        // Pretty-printed, sections in a fixed order.
        assert!(text.contains("\n  \"devices\""));
        let order: Vec<_> = [
            "\"devices\"",
            "\"itsm_changemanagement_items\"",
            "\"itsm_outage_items\"",
            "\"itsm_knowledgebase_items\"",
        ]
        .iter()
        .map(|key| text.find(key).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        let out = parse(&text);
        assert!(out.get("error").is_none());
        assert_eq!(out["devices"], parse(&input));
        assert_eq!(out["itsm_changemanagement_items"]["0"]["cr_number"], "132145");
        assert_eq!(
            out["itsm_outage_items"]["0"]["incident_devicename"],
            json!(["leaf-sw16"])
        );
        assert_eq!(out["itsm_knowledgebase_items"]["1"]["kb_number"], "KB98765");
    }

    #[test]
    fn audit_echoes_devices_verbatim() {
        let input = r#"{"devices":[{"hostname":"a","serial":123456789012345678901234567890,"model":"N9K"}]}"#;
        let text = itsm_audit(input, &DemoItsm::demo_records()).unwrap();
        assert!(text.starts_with(&format!("{{\n  \"devices\": {input},\n")), "{text}");
    }

    #[test]
    fn inventory_keeps_device_field_order() {
        let doc = inventory_document(&DemoInventory::devices()).unwrap();
        assert!(
            doc.starts_with(r#"{"devices":[{"hostname":"spine-sw01","model":"#),
            "{doc}"
        );
    }

    #[test]
    fn summary_is_truncated_at_200_chars() {
        assert_eq!(plan_summary("short plan"), "short plan");

        let exact = "x".repeat(200);
        assert_eq!(plan_summary(&exact), exact);

        let long = "é".repeat(250);
        let summary = plan_summary(&long);
        assert_eq!(summary.chars().count(), 203);
        assert!(summary.ends_with("..."));
    }

    #[tokio::test]
    async fn intersight_returns_six_devices_and_records_hostnames() {
        let out = tools()
            .execute(&call(INTERSIGHT_TOOL, "devices", "anything"))
            .await
            .unwrap();

        let doc = parse(&out.content);
        let hosts: Vec<_> = doc["devices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["hostname"].as_str().unwrap())
            .collect();
        assert_eq!(
            hosts,
            ["spine-sw01", "spine-sw02", "leaf-sw13", "leaf-sw14", "leaf-sw15", "leaf-sw16"]
        );
        assert_eq!(out.updates.len(), 1);
        assert_eq!(out.updates[0].0, "devices");
        assert_eq!(out.updates[0].1.as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn approval_rejects_blank_plan() {
        for plan in ["", "  "] {
            let out = tools()
                .execute(&call(ITSM_APPROVAL, "plan", plan))
                .await
                .unwrap();
            assert_eq!(out.content, EMPTY_PLAN_ERROR);
            assert!(out.updates.is_empty());
        }
    }

    #[tokio::test]
    async fn approval_issues_a_ticket() {
        let plan = format!("Upgrade spine-sw01 first. {}", "Then leaves. ".repeat(30));
        let out = tools()
            .execute(&call(ITSM_APPROVAL, "plan", &plan))
            .await
            .unwrap();

        let text = &out.content;
        assert!(text.starts_with("ITSM Approval Status: SUBMITTED\n"));
        assert!(text.contains("Ticket ID: FWUP-20250601-120000\n"));
        assert!(text.contains("Submitted At: 2025-06-01 12:00:00\n"));
        let summary_line = text
            .lines()
            .find(|l| l.starts_with("Plan Summary: "))
            .unwrap();
        assert_eq!(
            summary_line,
            format!("Plan Summary: {}...", &plan[..200])
        );
        assert!(text.ends_with("4. Final approval by change board"));

        let updates: std::collections::HashMap<_, _> = out.updates.into_iter().collect();
        assert_eq!(updates["upgrade_plan"], Value::String(plan));
        assert_eq!(updates["approval_status"], "SUBMITTED");
    }

    #[tokio::test]
    async fn structured_devices_argument_is_accepted() {
        let call = ToolCall {
            id: "call_2".into(),
            name: ITSM_AUDIT.into(),
            input: json!({ "devices_json": { "devices": [{ "hostname": "leaf-sw13" }] } }),
        };
        let out = parse(&tools().execute(&call).await.unwrap().content);
        assert_eq!(out["devices"]["devices"][0]["hostname"], "leaf-sw13");
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let err = tools()
            .execute(&call("RebootAll", "devices", "*"))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::NotFound("RebootAll".into()));
    }
}
