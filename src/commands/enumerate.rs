use super::Plan;

pub fn plan() -> Plan {
    Plan {
        action: "Enumerate devices",
        rows: Vec::new(),
    }
}
