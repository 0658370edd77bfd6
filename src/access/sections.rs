use crate::models::role::Role;
use serde::Serialize;

/// Console section reachable from the navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Dashboard,
    Upload,
    MyJobs,
    Pending,
    History,
    Printers,
    Jobs,
    Users,
    AdminUsers,
    Reports,
    Settings,
}

impl Section {
    pub const ALL: [Section; 11] = [
        Section::Dashboard,
        Section::Upload,
        Section::MyJobs,
        Section::Pending,
        Section::History,
        Section::Printers,
        Section::Jobs,
        Section::Users,
        Section::AdminUsers,
        Section::Reports,
        Section::Settings,
    ];

    fn roles(&self) -> &'static [Role] {
        use Role::*;
        match self {
            Section::Dashboard => &[Student, Teacher, Technician, Admin, External],
            Section::Upload | Section::MyJobs | Section::Pending | Section::History => {
                &[Student, Teacher, External]
            }
            Section::Printers | Section::Jobs | Section::Reports => &[Admin, Technician],
            Section::Users | Section::AdminUsers | Section::Settings => &[Admin],
        }
    }
}

pub fn can_open(role: Role, section: Section) -> bool {
    section.roles().contains(&role)
}

/// Sections shown in the navigation for `role`, in menu order.
pub fn navigation(role: Role) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|section| can_open(role, *section))
        .collect()
}
