//! User documents and the checks that run before a password is hashed

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::PasswordHasher;
use crate::repository::{Document, FieldViolation, MemoryCollection, Resource};

/// Collection of users
pub type Users = MemoryCollection<User>;

/// Roles a user may hold
pub const ROLES: [&str; 4] = ["user", "guide", "lead-guide", "admin"];

/// Body fields a signup may set
pub const SIGNUP_FIELDS: [&str; 5] = ["name", "email", "password", "passwordConfirm", "role"];

/// Body fields `updateMe` applies
pub const SELF_UPDATE_FIELDS: [&str; 2] = ["name", "email"];

/// Fields only the password routes may change
pub const PASSWORD_FIELDS: [&str; 2] = ["password", "passwordConfirm"];

fn default_role() -> String {
    "user".to_string()
}

fn default_active() -> bool {
    true
}

/// A registered user
///
/// `password` holds an Argon2id PHC string, never the plain password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Resource for User {
    const MODEL: &'static str = "User";
    const SINGULAR: &'static str = "user";
    const PLURAL: &'static str = "users";
    const REQUIRED: &'static [(&'static str, &'static str)] = &[
        ("name", "Name is required"),
        ("email", "Email is required"),
        ("password", "Password is required"),
    ];
    const HIDDEN: &'static [&'static str] = &["active"];
    const SECRET: &'static [&'static str] = &["password", "passwordChangedAt"];
    const UNIQUE: &'static [&'static str] = &["email"];

    fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if !looks_like_email(&self.email) {
            violations.push(FieldViolation::new("email", "Should be email formatted"));
        }
        if !ROLES.contains(&self.role.as_str()) {
            violations.push(FieldViolation::new(
                "role",
                format!("`{}` is not a valid role", self.role),
            ));
        }
        violations
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn text<'a>(body: &'a Document, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Check a new password and its confirmation before hashing
///
/// Violations name `password_field` and `confirm_field`, so the same check
/// serves signup (`password`, `passwordConfirm`) and password changes
/// (`newPassword`, `newPasswordConfirm`).
pub fn check_new_password(
    body: &Document,
    password_field: &'static str,
    confirm_field: &'static str,
    hasher: &PasswordHasher,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    let password = text(body, password_field);
    match password {
        None => violations.push(FieldViolation::new(password_field, "Password is required")),
        Some(password) => {
            if let Some(message) = hasher.check_length(password) {
                violations.push(FieldViolation::new(password_field, message));
            }
        }
    }
    match text(body, confirm_field) {
        None => violations.push(FieldViolation::new(confirm_field, "Confirm Password is required")),
        Some(confirm) if password.is_some_and(|p| p != confirm) => {
            violations.push(FieldViolation::new(confirm_field, "Password are not the same"))
        }
        Some(_) => {}
    }
    violations
}

/// Everything a signup body must get right before its password is hashed
pub fn check_signup(body: &Document, hasher: &PasswordHasher) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = User::REQUIRED
        .iter()
        .filter(|(field, _)| *field != "password" && text(body, field).is_none())
        .map(|&(field, message)| FieldViolation::new(field, message))
        .collect();
    violations.extend(check_new_password(body, "password", "passwordConfirm", hasher));
    violations
}

/// Keep only `fields` of `body`
pub fn pick(body: Document, fields: &[&str]) -> Document {
    body.into_iter()
        .filter(|(key, _)| fields.contains(&key.as_str()))
        .collect()
}

/// Whether `body` tries to set a password field
pub fn touches_password(body: &Document) -> bool {
    PASSWORD_FIELDS.iter().any(|field| body.contains_key(*field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordConfig;
    use crate::repository::{conform, RepositoryOperation};
    use serde_json::json;

    fn body(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
            min_password_length: 8,
        })
        .unwrap()
    }

    #[test]
    fn test_email_is_lowercased_and_checked() {
        let doc = conform::<User>(
            body(json!({"name": "Ada", "email": " Ada@Example.COM ", "password": "hash"})),
            RepositoryOperation::Create,
        )
        .unwrap();
        assert_eq!(doc["email"], json!("ada@example.com"));
        assert_eq!(doc["role"], json!("user"));
        assert_eq!(doc["active"], json!(true));

        let err = conform::<User>(
            body(json!({"name": "Ada", "email": "not-an-email", "password": "hash"})),
            RepositoryOperation::Create,
        )
        .unwrap_err();
        assert_eq!(err.message, "User validation failed: email: Should be email formatted");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = conform::<User>(
            body(json!({"name": "Ada", "email": "ada@example.com", "password": "h", "role": "root"})),
            RepositoryOperation::Create,
        )
        .unwrap_err();
        assert!(err.message.contains("role"));
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("jonas@example.io"));
        assert!(!looks_like_email("jonas@example"));
        assert!(!looks_like_email("@example.io"));
        assert!(!looks_like_email("jo nas@example.io"));
        assert!(!looks_like_email("a@b@c.io"));
    }

    #[test]
    fn test_check_new_password() {
        let hasher = hasher();
        let ok = body(json!({"password": "pass1234", "passwordConfirm": "pass1234"}));
        assert!(check_new_password(&ok, "password", "passwordConfirm", &hasher).is_empty());

        let short = body(json!({"password": "short", "passwordConfirm": "short"}));
        let violations = check_new_password(&short, "password", "passwordConfirm", &hasher);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "password");

        let mismatch = body(json!({"newPassword": "pass1234", "newPasswordConfirm": "pass4321"}));
        let violations = check_new_password(&mismatch, "newPassword", "newPasswordConfirm", &hasher);
        assert_eq!(
            violations,
            vec![FieldViolation::new("newPasswordConfirm", "Password are not the same")]
        );

        let missing = body(json!({}));
        assert_eq!(
            check_new_password(&missing, "password", "passwordConfirm", &hasher).len(),
            2
        );
    }

    #[test]
    fn test_check_signup_aggregates_in_field_order() {
        let violations = check_signup(&body(json!({"email": "ada@example.com"})), &hasher());
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "password", "passwordConfirm"]);
    }

    #[test]
    fn test_pick_and_touches_password() {
        let picked = pick(
            body(json!({"name": "Ada", "role": "admin", "photo": "x.jpg"})),
            &SELF_UPDATE_FIELDS,
        );
        assert_eq!(picked, body(json!({"name": "Ada"})));
        assert!(touches_password(&body(json!({"passwordConfirm": "x"}))));
        assert!(!touches_password(&picked));
    }
}
