//! Action creators with client-side validation
//!
//! Invalid input is rejected here, before any action exists, so a rejected
//! form never touches a slice's `loading` or `error` fields.

use crate::action::Action;
use crate::error::ValidationError;
use crate::records::UserProfilePatch;

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

fn email_address(value: &str) -> Result<String, ValidationError> {
    let email = required("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// Passwords are taken verbatim; only emptiness is checked.
fn password(value: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    Ok(value.to_string())
}

fn confirmed(value: &str, confirmation: &str) -> Result<String, ValidationError> {
    let value = password(value)?;
    if value != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(value)
}

pub fn login(email: &str, pass: &str) -> Result<Action, ValidationError> {
    Ok(Action::AuthLogin {
        email: email_address(email)?,
        password: password(pass)?,
    })
}

pub fn register(
    username: &str,
    email: &str,
    pass: &str,
    confirmation: &str,
) -> Result<Action, ValidationError> {
    Ok(Action::AuthRegister {
        username: required("username", username)?,
        email: email_address(email)?,
        password: confirmed(pass, confirmation)?,
    })
}

pub fn forgot_password(email: &str) -> Result<Action, ValidationError> {
    Ok(Action::AuthForgotPassword {
        email: email_address(email)?,
    })
}

pub fn reset_password(
    token: &str,
    pass: &str,
    confirmation: &str,
) -> Result<Action, ValidationError> {
    Ok(Action::AuthResetPassword {
        token: required("token", token)?,
        password: confirmed(pass, confirmation)?,
    })
}

/// Present username/email fields must be valid; absent ones are untouched.
pub fn update_profile(mut patch: UserProfilePatch) -> Result<Action, ValidationError> {
    if let Some(Some(username)) = &patch.username {
        patch.username = Some(Some(required("username", username)?));
    }
    if let Some(Some(email)) = &patch.email {
        patch.email = Some(Some(email_address(email)?));
    }
    Ok(Action::ProfileUpdate(patch))
}

/// Accepts raw or FASTA-formatted input: header lines (`>`) and all
/// whitespace are dropped.
pub fn search_sequence(query: &str) -> Result<Action, ValidationError> {
    let sequence: String = query
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();

    if sequence.is_empty() {
        return Err(ValidationError::EmptyField("sequence"));
    }
    Ok(Action::SequencesSearch { sequence })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_validation() {
        assert_eq!(
            login(" a@b.org ", "pw"),
            Ok(Action::AuthLogin {
                email: "a@b.org".into(),
                password: "pw".into()
            })
        );
        assert_eq!(login("", "pw"), Err(ValidationError::EmptyField("email")));
        assert_eq!(login("nobody", "pw"), Err(ValidationError::InvalidEmail));
        assert_eq!(login("a@", "pw"), Err(ValidationError::InvalidEmail));
        assert_eq!(
            login("a@b.org", ""),
            Err(ValidationError::EmptyField("password"))
        );
    }

    #[test]
    fn test_register_requires_matching_confirmation() {
        assert_eq!(
            register("ana", "a@b.org", "secret", "secreT"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            register(" ", "a@b.org", "secret", "secret"),
            Err(ValidationError::EmptyField("username"))
        );
        assert!(register("ana", "a@b.org", "secret", "secret").is_ok());
    }

    #[test]
    fn test_reset_password() {
        assert_eq!(
            reset_password("tok", "a", "b"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            reset_password("", "a", "a"),
            Err(ValidationError::EmptyField("token"))
        );
    }

    #[test]
    fn test_update_profile_checks_present_fields() {
        let patch = UserProfilePatch {
            email: Some(Some("broken".into())),
            ..Default::default()
        };
        assert_eq!(update_profile(patch), Err(ValidationError::InvalidEmail));

        let patch = UserProfilePatch {
            role: Some(None),
            ..Default::default()
        };
        assert!(update_profile(patch).is_ok());
    }

    #[test]
    fn test_search_strips_fasta_header() {
        assert_eq!(
            search_sequence(">allele_1 description\nATGAAA\nTTT TAA\n"),
            Ok(Action::SequencesSearch {
                sequence: "ATGAAATTTTAA".into()
            })
        );
        assert_eq!(
            search_sequence(">only a header\n"),
            Err(ValidationError::EmptyField("sequence"))
        );
    }
}
