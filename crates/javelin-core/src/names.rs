use std::fmt;

use smol_str::SmolStr;

/// A simple (unqualified) Java identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(SmolStr);

impl Name {
    #[inline]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(SmolStr::new(text.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self(SmolStr::from(value))
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A dotted name such as `java.util.Map.Entry`.
///
/// The name is stored as segments; whether a segment denotes a package or a
/// type is decided by the resolver, not here.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    segments: Vec<Name>,
}

impl QualifiedName {
    pub fn from_dotted(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Name::from)
            .collect();
        Self { segments }
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Name>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn first(&self) -> Option<&Name> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Name> {
        self.segments.last()
    }

    /// Everything except the last segment.
    pub fn qualifier(&self) -> Option<QualifiedName> {
        let (_, init) = self.segments.split_last()?;
        if init.is_empty() {
            return None;
        }
        Some(Self {
            segments: init.to_vec(),
        })
    }

    pub fn push(&mut self, name: Name) {
        self.segments.push(name);
    }

    pub fn child(&self, name: impl Into<Name>) -> QualifiedName {
        let mut out = self.clone();
        out.push(name.into());
        out
    }

    pub fn to_dotted(&self) -> String {
        self.join('.')
    }

    /// Render with `/` separators, the JVM internal form for packages.
    pub fn to_internal(&self) -> String {
        self.join('/')
    }

    fn join(&self, sep: char) -> String {
        let mut out = String::new();
        for (idx, seg) in self.segments.iter().enumerate() {
            if idx > 0 {
                out.push(sep);
            }
            out.push_str(seg.as_str());
        }
        out
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedName({:?})", self.to_dotted())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// A package name. The unnamed (default) package has no segments.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct PackageName(QualifiedName);

impl PackageName {
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn from_dotted(dotted: &str) -> Self {
        Self(QualifiedName::from_dotted(dotted))
    }

    pub fn is_unnamed(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Name] {
        self.0.segments()
    }

    pub fn to_dotted(&self) -> String {
        self.0.to_dotted()
    }

    /// Qualify a simple type name with this package (`p.q` + `C` = `p.q.C`).
    pub fn qualify(&self, simple: &str) -> String {
        if self.is_unnamed() {
            simple.to_string()
        } else {
            format!("{}.{}", self.0.to_dotted(), simple)
        }
    }

    pub fn starts_with_segment(&self, segment: &str) -> bool {
        self.0.first().is_some_and(|s| s.as_str() == segment)
    }
}

impl fmt::Debug for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageName({:?})", self.to_dotted())
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_round_trips_dotted_form() {
        let name = QualifiedName::from_dotted("java.util.Map.Entry");
        assert_eq!(name.len(), 4);
        assert_eq!(name.to_dotted(), "java.util.Map.Entry");
        assert_eq!(name.to_internal(), "java/util/Map/Entry");
        assert_eq!(name.last().map(Name::as_str), Some("Entry"));
        assert_eq!(
            name.qualifier().map(|q| q.to_dotted()),
            Some("java.util.Map".to_string())
        );
    }

    #[test]
    fn single_segment_has_no_qualifier() {
        assert_eq!(QualifiedName::from_dotted("B").qualifier(), None);
    }

    #[test]
    fn unnamed_package_qualifies_to_simple_name() {
        assert_eq!(PackageName::unnamed().qualify("A"), "A");
        assert_eq!(PackageName::from_dotted("p.q").qualify("A"), "p.q.A");
        assert!(PackageName::from_dotted("").is_unnamed());
    }
}
