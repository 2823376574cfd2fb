//! Identifier normalisation for skill names.

use deunicode::deunicode_char;

/// Derive the lowercase, hyphen-separated identifier for a skill name.
///
/// Non-ASCII letters are transliterated, so names in any script keep a
/// distinct slug. The result is empty only when nothing alphanumeric remains.
///
/// ```
/// use quiver_skills::slug::slugify;
/// assert_eq!(slugify("Git Master"), "git-master");
/// assert_eq!(slugify("Über Skill"), "uber-skill");
/// assert_eq!(slugify("Привет мир"), "privet-mir");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = Slug::default();
    for c in name.chars() {
        if c == '@' {
            slug.separator();
            slug.push_str("at");
            slug.separator();
        } else if c.is_ascii() {
            slug.push_ascii(c);
        } else if let Some(ascii) = deunicode_char(c) {
            ascii.chars().for_each(|a| slug.push_ascii(a));
        }
    }
    slug.out
}

#[derive(Default)]
struct Slug {
    out: String,
    pending_sep: bool,
}

impl Slug {
    fn push_ascii(&mut self, c: char) {
        if c.is_ascii_alphanumeric() {
            self.push_str(c.to_ascii_lowercase().encode_utf8(&mut [0; 4]));
        } else if c == '_' || c == '-' || c.is_ascii_whitespace() {
            self.separator();
        }
    }

    fn separator(&mut self) {
        self.pending_sep = true;
    }

    fn push_str(&mut self, piece: &str) {
        if self.pending_sep && !self.out.is_empty() {
            self.out.push('-');
        }
        self.pending_sep = false;
        self.out.push_str(piece);
    }
}
