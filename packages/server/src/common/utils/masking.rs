/// Shown instead of a donor's name on anonymous donations.
pub const ANONYMOUS_DONOR_NAME: &str = "Anonim Bağışçı";

/// `a***@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

/// `Ayşe Yılmaz` becomes `A*** Y***`.
pub fn mask_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| {
            let first: String = part.chars().take(1).collect();
            format!("{}***", first)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_email_local_part() {
        assert_eq!(mask_email("ayse@example.com"), "a***@example.com");
        assert_eq!(mask_email("broken"), "***");
        assert_eq!(mask_email("@example.com"), "***");
    }

    #[test]
    fn masks_each_name_part() {
        assert_eq!(mask_name("Ayşe Yılmaz"), "A*** Y***");
        assert_eq!(mask_name("Şule"), "Ş***");
    }
}
