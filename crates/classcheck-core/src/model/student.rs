// ── Student domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StudentId;
use crate::error::CoreError;

pub const NAME_MAX_LEN: usize = 100;
pub const ROLL_NO_MAX_LEN: usize = 50;
pub const DEPARTMENT_MAX_LEN: usize = 100;

/// A roster entry. `roll_no` is the human-entered key students identify
/// themselves with and is unique across the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub roll_no: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for registering a new student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub roll_no: String,
    pub department: String,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), CoreError> {
        check_field("name", &self.name, NAME_MAX_LEN)?;
        check_field("roll_no", &self.roll_no, ROLL_NO_MAX_LEN)?;
        check_field("department", &self.department, DEPARTMENT_MAX_LEN)
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl StudentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.roll_no.is_none() && self.department.is_none()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "nothing to update: provide at least one field".into(),
            });
        }
        if let Some(name) = &self.name {
            check_field("name", name, NAME_MAX_LEN)?;
        }
        if let Some(roll_no) = &self.roll_no {
            check_field("roll_no", roll_no, ROLL_NO_MAX_LEN)?;
        }
        if let Some(department) = &self.department {
            check_field("department", department, DEPARTMENT_MAX_LEN)?;
        }
        Ok(())
    }

    /// Apply the changed fields onto an existing student.
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name.clone_from(name);
        }
        if let Some(roll_no) = &self.roll_no {
            student.roll_no.clone_from(roll_no);
        }
        if let Some(department) = &self.department {
            student.department.clone_from(department);
        }
    }
}

fn check_field(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: format!("{field} must not be empty"),
        });
    }
    let len = value.chars().count();
    if len > max {
        return Err(CoreError::ValidationFailed {
            message: format!("{field} must be at most {max} characters (got {len})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_student() -> NewStudent {
        NewStudent {
            name: "Asha Rao".into(),
            roll_no: "CS001".into(),
            department: "Computer Science".into(),
        }
    }

    #[test]
    fn valid_student_passes() {
        assert!(new_student().validate().is_ok());
    }

    #[test]
    fn blank_roll_is_rejected() {
        let mut s = new_student();
        s.roll_no = "   ".into();
        assert!(matches!(
            s.validate(),
            Err(CoreError::ValidationFailed { message }) if message.contains("roll_no")
        ));
    }

    #[test]
    fn oversized_name_is_rejected() {
        let mut s = new_student();
        s.name = "x".repeat(NAME_MAX_LEN + 1);
        assert!(s.validate().is_err());
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(StudentUpdate::default().validate().is_err());
    }

    #[test]
    fn update_applies_only_changed_fields() {
        let mut student = Student {
            id: StudentId::new(1),
            name: "Asha".into(),
            roll_no: "CS001".into(),
            department: "CS".into(),
            created_at: Utc::now(),
        };
        let update = StudentUpdate {
            department: Some("EE".into()),
            ..Default::default()
        };
        update.apply_to(&mut student);
        assert_eq!(student.name, "Asha");
        assert_eq!(student.department, "EE");
    }
}
