//! Firmware inventory and ITSM capabilities behind the network tools.
//!
//! The bundled implementations return fixed demo data. A deployment swaps in
//! clients for its own inventory and ITSM systems behind the same traits.

use chrono::{Local, NaiveDateTime};
use runtime::ToolError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

/// One switch as reported by the firmware inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub hostname: String,
    pub model: String,
    pub role: String,
    pub current_firmware: String,
    pub recommended_firmware: String,
}

impl Device {
    fn new(hostname: &str, model: &str, role: &str, current: &str, recommended: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            model: model.to_string(),
            role: role.to_string(),
            current_firmware: current.to_string(),
            recommended_firmware: recommended.to_string(),
        }
    }
}

/// Devices whose firmware is behind the recommended release.
pub trait InventorySource: Send + Sync {
    fn outdated_devices(&self) -> impl Future<Output = Result<Vec<Device>, ToolError>> + Send;
}

/// Scheduled change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub devicename: String,
    pub cr_number: String,
    pub cr_status: String,
    pub cr_description: String,
}

/// Open incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageItem {
    pub incident_devicename: Vec<String>,
    pub incident_number: String,
    pub incident_status: String,
    pub incident_description: String,
}

/// Knowledge base article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseItem {
    pub kb_title: String,
    pub kb_number: String,
    pub kb_device_type: String,
    pub kb_description: String,
    pub kb_notes: String,
}

/// ITSM records relevant to an upgrade, keyed by position (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItsmRecords {
    pub changes: BTreeMap<String, ChangeItem>,
    pub outages: BTreeMap<String, OutageItem>,
    pub knowledge_base: BTreeMap<String, KnowledgeBaseItem>,
}

/// A submitted approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalTicket {
    pub ticket_id: String,
    pub status: String,
    pub submitted_at: NaiveDateTime,
}

impl ApprovalTicket {
    /// A `SUBMITTED` ticket with an id derived from the submission time.
    pub fn submitted_at(submitted_at: NaiveDateTime) -> Self {
        Self {
            ticket_id: format!("FWUP-{}", submitted_at.format("%Y%m%d-%H%M%S")),
            status: "SUBMITTED".to_string(),
            submitted_at,
        }
    }
}

/// Change management, incident and knowledge base lookups plus approvals.
pub trait ItsmSource: Send + Sync {
    fn records(&self) -> impl Future<Output = Result<ItsmRecords, ToolError>> + Send;

    fn submit_for_approval(
        &self,
        plan: &str,
    ) -> impl Future<Output = Result<ApprovalTicket, ToolError>> + Send;
}

fn keyed<T>(items: Vec<T>) -> BTreeMap<String, T> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| (i.to_string(), item))
        .collect()
}

/// Fixed six-switch fabric.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoInventory;

impl DemoInventory {
    pub fn devices() -> Vec<Device> {
        const SPINE: (&str, &str, &str) = ("N9K-C9336C-FX2", "7.0(3)I7(4)", "10.4.5");
        const LEAF: (&str, &str, &str) = ("N9K-C93180YC-EX", "9.2(1)", "10.3.6");

        let spines = ["spine-sw01", "spine-sw02"]
            .map(|host| Device::new(host, SPINE.0, "spine", SPINE.1, SPINE.2));
        let leaves = ["leaf-sw13", "leaf-sw14", "leaf-sw15", "leaf-sw16"]
            .map(|host| Device::new(host, LEAF.0, "leaf", LEAF.1, LEAF.2));

        spines.into_iter().chain(leaves).collect()
    }
}

impl InventorySource for DemoInventory {
    async fn outdated_devices(&self) -> Result<Vec<Device>, ToolError> {
        Ok(Self::devices())
    }
}

/// Fixed ITSM data; tickets are stamped with the local clock unless pinned.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoItsm {
    clock: Option<NaiveDateTime>,
}

impl DemoItsm {
    /// Stamp every ticket with `now` instead of the local clock.
    pub fn at(now: NaiveDateTime) -> Self {
        Self { clock: Some(now) }
    }

    pub fn demo_records() -> ItsmRecords {
        let change = |device: &str, cr: &str, description: &str| ChangeItem {
            devicename: device.to_string(),
            cr_number: cr.to_string(),
            cr_status: "scheduled".to_string(),
            cr_description: description.to_string(),
        };
        let outage = |device: &str, incident: &str, description: &str| OutageItem {
            incident_devicename: vec![device.to_string()],
            incident_number: incident.to_string(),
            incident_status: "open".to_string(),
            incident_description: description.to_string(),
        };

        ItsmRecords {
            changes: keyed(vec![
                change("leaf-sw14", "132145", "PowerSupply 1 Replacement - RMA"),
                change("leaf-sw99", "651234", "QSFP Replacement - RMA"),
            ]),
            outages: keyed(vec![
                outage(
                    "leaf-sw16",
                    "123456",
                    "Multiple TX errors observed on the port channel 115",
                ),
                outage("server-sw99", "654321", "NVME is reporting errors"),
            ]),
            knowledge_base: keyed(vec![
                KnowledgeBaseItem {
                    kb_title: "Traffic egressing out same port-channel it is received on"
                        .to_string(),
                    kb_number: "CSCve24947".to_string(),
                    kb_device_type: "Cisco 9300 Series Switches".to_string(),
                    kb_description: "The packet needs to have a destination mac (unicast packet) \
                        which is learned on the source port-channel. So if the packet came in \
                        port-channel1, then packet needs to have a dmac which is getting learned \
                        on po1."
                        .to_string(),
                    kb_notes: "This issue is solved in version 7.0(3)I4(7) and higher."
                        .to_string(),
                },
                KnowledgeBaseItem {
                    kb_title: "Cisco Nexus Spine Upgrades".to_string(),
                    kb_number: "KB98765".to_string(),
                    kb_device_type: "Cisco 9300 Series Spine Switches".to_string(),
                    kb_description: "Cisco Nexus 9300 Spine Upgrades".to_string(),
                    kb_notes: "All Cisco Spine Switches Upgrades should be approved by Jerry \
                        Garcia."
                        .to_string(),
                },
            ]),
        }
    }
}

impl ItsmSource for DemoItsm {
    async fn records(&self) -> Result<ItsmRecords, ToolError> {
        Ok(Self::demo_records())
    }

    async fn submit_for_approval(&self, _plan: &str) -> Result<ApprovalTicket, ToolError> {
        let now = self.clock.unwrap_or_else(|| Local::now().naive_local());
        Ok(ApprovalTicket::submitted_at(now))
    }
}
