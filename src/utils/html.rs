use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive,
/// dangerous tags (<script>, <iframe>) and attributes (onclick) are
/// stripped. Applied to user-supplied text (review comments, profile
/// about-me, restaurant descriptions) before it is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = clean_html("Great food!<script>alert('xss')</script>");
        assert_eq!(cleaned, "Great food!");
    }

    #[test]
    fn keeps_plain_text() {
        assert_eq!(clean_html("Best tacos in town"), "Best tacos in town");
    }
}
