//! `show qos` and `show interfaces qos` output.

use std::collections::BTreeMap;

use sonic_db_common::{ConfigDb, FieldMap};

use crate::error::CliResult;
use crate::format::{natural_cmp, natural_sort, Table};
use crate::tables::{QosMapKind, INTERFACE_MAP_LABELS, PFC_ENABLE_FIELD, PORT_QOS_MAP};

/// Renders the profiles of `kind`, or only `profile` when given.
pub async fn show_qos_map(
    db: &dyn ConfigDb,
    kind: QosMapKind,
    profile: Option<&str>,
) -> CliResult<String> {
    if kind == QosMapKind::DscpTc {
        return show_dscp_to_tc(db, profile).await;
    }

    let mut out = String::new();
    match profile {
        None => {
            let profiles = db.get_table(kind.table()).await?;
            for name in sorted_keys(&profiles) {
                out.push_str(&format!("{} policy: {}\n", kind, name));
                let table = map_table(kind, &profiles[name]);
                if !table.is_empty() {
                    out.push_str(&table.render());
                    out.push_str("\n\n");
                }
            }
        }
        Some(name) => {
            let entry = db.get_entry(kind.table(), name).await?;
            if !entry.is_empty() {
                out.push_str(&format!("{} policy: {}\n", kind, name));
                let table = map_table(kind, &entry);
                if !table.is_empty() {
                    out.push_str(&table.render());
                    out.push('\n');
                }
            }
        }
    }

    Ok(out)
}

/// One row per present key, in numeric key order.
fn map_table(kind: QosMapKind, entry: &FieldMap) -> Table {
    let mut table = Table::new(kind.show_header());
    for key in 0..kind.key_max() {
        if let Some(value) = entry.get(&key.to_string()) {
            table.add_row([key.to_string(), value.clone()]);
        }
    }
    table
}

/// DSCP maps are shown grouped by traffic class.
async fn show_dscp_to_tc(db: &dyn ConfigDb, profile: Option<&str>) -> CliResult<String> {
    let kind = QosMapKind::DscpTc;
    let profiles = db.get_table(kind.table()).await?;

    let mut out = String::new();
    for name in sorted_keys(&profiles) {
        if profile.is_some_and(|wanted| wanted != name) {
            continue;
        }

        let mut by_tc: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (dscp, tc) in &profiles[name] {
            by_tc.entry(tc.as_str()).or_default().push(dscp.as_str());
        }
        let mut groups: Vec<_> = by_tc.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| natural_cmp(a, b));

        let mut table = Table::new(kind.show_header());
        for (tc, mut dscps) in groups {
            natural_sort(&mut dscps);
            table.add_row([dscps.join(" "), tc.to_string()]);
        }

        out.push_str(&format!("{} policy: {}\n", kind, name));
        out.push_str(&table.render());
        out.push_str("\n\n");
    }

    Ok(out)
}

/// Renders the maps bound to every interface, or only to `interface`.
pub async fn show_interfaces_qos(db: &dyn ConfigDb, interface: Option<&str>) -> CliResult<String> {
    let mut out = String::new();
    match interface {
        None => {
            let bindings = db.get_table(PORT_QOS_MAP).await?;
            for name in sorted_keys(&bindings) {
                out.push_str(&format!("{}:\n", name));
                push_bindings(&mut out, &bindings[name]);
                out.push('\n');
            }
        }
        Some(name) => {
            let entry = db.get_entry(PORT_QOS_MAP, name).await?;
            push_bindings(&mut out, &entry);
        }
    }
    Ok(out)
}

fn push_bindings(out: &mut String, entry: &FieldMap) {
    for (field, label) in INTERFACE_MAP_LABELS {
        if let Some(profile) = entry.get(*field) {
            out.push_str(&format!("  {}: {}\n", label, profile));
        }
    }
    if let Some(priorities) = entry.get(PFC_ENABLE_FIELD) {
        out.push_str(&format!("  pfc-priority: {}\n", priorities));
    }
}

fn sorted_keys<V>(table: &BTreeMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
    natural_sort(&mut keys);
    keys
}
