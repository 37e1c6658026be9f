/// Account roles recognized by the user form. Anything else (including an
/// empty selection on a fresh form) is `Unrecognized` rather than a silent
/// string fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Chief Inspector of Schools.
    Cis,
    /// School Improvement Support Officer.
    Siso,
    HeadTeacher,
    Teacher,
    Unrecognized,
}

impl Role {
    pub fn parse(raw: &str) -> Role {
        match raw.trim() {
            "cis" => Role::Cis,
            "siso" => Role::Siso,
            "headteacher" => Role::HeadTeacher,
            "teacher" => Role::Teacher,
            _ => Role::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cis => "cis",
            Role::Siso => "siso",
            Role::HeadTeacher => "headteacher",
            Role::Teacher => "teacher",
            Role::Unrecognized => "unrecognized",
        }
    }
}

/// The auxiliary form fields driven by the role selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxField {
    District,
    Circuit,
    School,
}

/// Visibility of the three auxiliary fields. At most one is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldVisibility {
    pub district: bool,
    pub circuit: bool,
    pub school: bool,
}

/// Which auxiliary field a role exposes: district for CIS, circuit for SISO,
/// school for head teachers and teachers, none otherwise.
pub fn visible_field(role: Role) -> Option<AuxField> {
    match role {
        Role::Cis => Some(AuxField::District),
        Role::Siso => Some(AuxField::Circuit),
        Role::HeadTeacher | Role::Teacher => Some(AuxField::School),
        Role::Unrecognized => None,
    }
}

pub fn toggle_fields(role: Role) -> FieldVisibility {
    let shown = visible_field(role);
    FieldVisibility {
        district: shown == Some(AuxField::District),
        circuit: shown == Some(AuxField::Circuit),
        school: shown == Some(AuxField::School),
    }
}
