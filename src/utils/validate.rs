use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static CLASS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-9][0-9]?)([A-Z])$").expect("Invalid class id regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

/// 登录名 5..=16 位，仅字母数字、下划线和连字符
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    match username.len() {
        5..=16 if USERNAME_RE.is_match(username) => Ok(()),
        5..=16 => Err("Username may only contain letters, digits, '_' or '-'"),
        _ => Err("Username must be 5 to 16 characters long"),
    }
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    EMAIL_RE
        .is_match(email.trim())
        .then_some(())
        .ok_or("Email format is invalid")
}

/// 校验并规范化班级编号，返回 (大写编号, 年级)
///
/// 编号格式为年级数字加一个字母，例如 `7A`、`9c`。
pub fn validate_class_id(class_id: &str) -> Result<(String, i32), String> {
    let normalized = class_id.trim().to_ascii_uppercase();
    let captures = CLASS_ID_RE
        .captures(&normalized)
        .ok_or_else(|| format!("Invalid class id: {class_id}"))?;
    let grade = captures[1]
        .parse::<i32>()
        .map_err(|_| format!("Invalid class id: {class_id}"))?;
    if grade > 12 {
        return Err(format!("Invalid class id: {class_id}"));
    }
    Ok((normalized, grade))
}

/// 校验目标班级列表：非空，逐个规范化并去重（保持原顺序）
pub fn validate_class_ids(class_ids: &[String]) -> Result<Vec<String>, String> {
    if class_ids.is_empty() {
        return Err("At least one class must be selected".to_string());
    }
    let mut normalized: Vec<String> = Vec::with_capacity(class_ids.len());
    for class_id in class_ids {
        let (id, _) = validate_class_id(class_id)?;
        if !normalized.contains(&id) {
            normalized.push(id);
        }
    }
    Ok(normalized)
}

/// 标题 / 科目等必填文本：去除首尾空白后 1..=max 个字符
pub fn validate_required_text(
    field: &str,
    value: &str,
    max_chars: usize,
) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(format!("{field} must be at most {max_chars} characters"));
    }
    Ok(trimmed.to_string())
}

/// 密码规则：(不满足时的提示, 判定函数)
type PasswordRule = (&'static str, fn(&str) -> bool);

const PASSWORD_RULES: [PasswordRule; 4] = [
    ("at least 8 characters", |p| p.chars().count() >= 8),
    ("an uppercase letter", |p| p.chars().any(|c| c.is_ascii_uppercase())),
    ("a lowercase letter", |p| p.chars().any(|c| c.is_ascii_lowercase())),
    ("a digit", |p| p.chars().any(|c| c.is_ascii_digit())),
];

/// 满足字符规则但仍然过于常见的密码（忽略大小写比较）
const COMMON_PASSWORDS: [&str; 6] = [
    "password1",
    "qwerty123",
    "admin123",
    "abcd1234",
    "welcome1",
    "sekolah123",
];

/// 密码策略：长度不少于 8，同时含大小写字母和数字，且不在常见密码表中。
/// 不满足时把全部缺项合成一条提示返回。
pub fn validate_password(password: &str) -> Result<(), String> {
    let missing: Vec<&str> = PASSWORD_RULES
        .iter()
        .filter(|(_, check)| !check(password))
        .map(|(hint, _)| *hint)
        .collect();
    if !missing.is_empty() {
        return Err(format!("Password must contain {}", missing.join(", ")));
    }
    if COMMON_PASSWORDS
        .iter()
        .any(|common| password.eq_ignore_ascii_case(common))
    {
        return Err("Password is too common".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_id_normalization() {
        assert_eq!(validate_class_id("7a"), Ok(("7A".to_string(), 7)));
        assert_eq!(validate_class_id(" 9C "), Ok(("9C".to_string(), 9)));
        assert_eq!(validate_class_id("10B"), Ok(("10B".to_string(), 10)));
        for bad in ["", "7", "A7", "7AB", "0A", "13A", "7-A"] {
            assert!(validate_class_id(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_class_ids_deduplicated() {
        let ids = vec!["7a".to_string(), "7A".to_string(), "8b".to_string()];
        assert_eq!(validate_class_ids(&ids), Ok(vec!["7A".to_string(), "8B".to_string()]));
        assert!(validate_class_ids(&[]).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(validate_required_text("title", "  Quiz  ", 10), Ok("Quiz".to_string()));
        assert!(validate_required_text("title", "   ", 10).is_err());
        assert!(validate_required_text("title", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn test_username_and_email() {
        assert!(validate_username("guru_01").is_ok());
        assert!(validate_username("abc").is_err());
        assert!(validate_username("bad name!").is_err());
        assert!(validate_email("guru@sekolah.id").is_ok());
        assert!(validate_email("guru.sekolah.id").is_err());
    }

    #[test]
    fn test_password_policy() {
        for ok in ["SecureP@ss1", "MyP4ssw0rd", "Guru2025kelas"] {
            assert!(validate_password(ok).is_ok(), "{ok}");
        }

        let err = validate_password("ab1").unwrap_err();
        assert!(err.contains("at least 8 characters"));
        assert!(err.contains("an uppercase letter"));
        assert!(!err.contains("a digit"));

        assert!(validate_password("ABCD1234").unwrap_err().contains("a lowercase letter"));
        assert!(validate_password("AbcdEfgh").unwrap_err().contains("a digit"));
        assert_eq!(
            validate_password("Password1").unwrap_err(),
            "Password is too common"
        );
    }
}
