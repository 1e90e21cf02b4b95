use lazy_static::lazy_static;
use regex::Regex;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn check_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password too short");
    }
    if password.to_lowercase().contains("password") {
        return Err("Password must not contain the word \"password\"");
    }
    Ok(())
}

pub(crate) fn check_age(age: i32) -> Result<(), &'static str> {
    if age < 0 {
        return Err("Age must be a positive number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@mail.com"));
    }

    #[test]
    fn password_rules() {
        assert!(check_password("long-enough-secret").is_ok());
        assert!(check_password("short").is_err());
        assert!(check_password("myPassword123").is_err());
    }

    #[test]
    fn age_rule() {
        assert!(check_age(0).is_ok());
        assert!(check_age(42).is_ok());
        assert!(check_age(-1).is_err());
    }
}
