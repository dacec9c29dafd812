#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    /// Returns whether text from this author must be validated before it is
    /// stored. Assistant text is generated locally and trusted as-is.
    pub fn is_untrusted(&self) -> bool {
        return *self == Author::User;
    }
}
