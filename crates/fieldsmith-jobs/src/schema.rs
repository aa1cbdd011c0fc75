use fieldsmith_core::consts::SERVICE_GROUP_COUNT;
use std::collections::BTreeMap;

/// Company/profile fields, written before any indexed group. The order is
/// part of the observable behaviour and must stay stable.
pub const COMPANY_FIELDS: [&str; 13] = [
    "Company Name",
    "Company Owner First Name",
    "Company Email",
    "Company Phone (Aesthetic)",
    "Company Phone (Functional)",
    "Global Button Colors",
    "Broad Service Name",
    "Sub Headline Text",
    "Company GMB Link",
    "Company Facebook Link",
    "Google Map Embed",
    "GMB Review Link",
    "Company Instagram Link",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldCategory {
    Company,
    Service,
    ServiceArea,
}

impl FieldCategory {
    /// Category label the remote settings table shows in its rows
    #[must_use]
    pub fn remote_name(self) -> &'static str {
        match self {
            Self::Company | Self::Service => "Services",
            Self::ServiceArea => "Service Areas",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlannedField {
    /// Public name of the field, also used when creating it remotely
    pub label: String,
    /// Label the field is looked up under after creation. Only the bare
    /// "Service Area {i}" keys differ: the remote stores those as
    /// "Biz Area {i}". The area-suffixed text/headline fields do not remap.
    pub remote_label: String,
    pub category: FieldCategory,
    pub value: String,
}

/// Build the deterministic write plan over a merged field map: company
/// fields first, then each indexed group in ascending order. Absent and
/// empty values are skipped; keys outside the schema are never written.
#[must_use]
pub fn field_plan(values: &BTreeMap<String, String>) -> Vec<PlannedField> {
    let mut plan = Vec::new();

    for label in COMPANY_FIELDS {
        push_field(
            values,
            label.to_owned(),
            label.to_owned(),
            FieldCategory::Company,
            &mut plan,
        );
    }

    for index in 1..=SERVICE_GROUP_COUNT {
        push_field(
            values,
            format!("Service Area {index}"),
            format!("Biz Area {index}"),
            FieldCategory::ServiceArea,
            &mut plan,
        );

        for label in group_labels(index) {
            let remote_label = label.clone();
            push_field(values, label, remote_label, FieldCategory::Service, &mut plan);
        }
    }

    plan
}

fn group_labels(index: usize) -> Vec<String> {
    let mut labels = vec![
        format!("Service {index}"),
        format!("Service {index} Homepage Blurb"),
    ];
    labels.extend((1..=3).map(|n| format!("Service {index} Text {n}")));
    labels.extend((1..=3).map(|n| format!("Service {index} Headline {n}")));
    labels.extend((1..=3).map(|n| format!("Service Area {index} Text {n}")));
    labels.extend((1..=3).map(|n| format!("Service Area {index} Headline {n}")));
    labels
}

fn push_field(
    values: &BTreeMap<String, String>,
    label: String,
    remote_label: String,
    category: FieldCategory,
    plan: &mut Vec<PlannedField>,
) {
    let Some(value) = values.get(&label) else {
        return;
    };
    if value.is_empty() {
        return;
    }

    plan.push(PlannedField {
        label,
        remote_label,
        category,
        value: value.clone(),
    });
}
