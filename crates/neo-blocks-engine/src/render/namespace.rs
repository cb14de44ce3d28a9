use std::ops::Deref;
use std::sync::OnceLock;

use regex::Regex;

/// Scope `input_name` under `namespace`: `blocks[new1]` under `fields` becomes
/// `fields[blocks][new1]`.
pub fn namespace_input_name(input_name: &str, namespace: Option<&str>) -> String {
    let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) else {
        return input_name.to_string();
    };

    match input_name.find('[') {
        Some(0) => format!("{namespace}{input_name}"),
        Some(i) => format!("{namespace}[{}]{}", &input_name[..i], &input_name[i..]),
        None => format!("{namespace}[{input_name}]"),
    }
}

/// Turn an input name into something usable as an element id
pub fn format_input_id(input_name: &str) -> String {
    static BRACKETS: OnceLock<Regex> = OnceLock::new();
    let brackets = BRACKETS.get_or_init(|| Regex::new(r"[\[\]\\]+").expect("Invalid bracket regex"));
    brackets
        .replace_all(input_name, "-")
        .trim_end_matches('-')
        .to_string()
}

/// How many field containers deep a namespace is
pub fn namespace_depth(namespace: Option<&str>) -> usize {
    static FIELDS: OnceLock<Regex> = OnceLock::new();
    let fields = FIELDS.get_or_init(|| Regex::new(r"\bfields\b").expect("Invalid fields regex"));
    namespace.map_or(0, |ns| fields.find_iter(ns).count())
}

/// Per-request render state. Each request owns its own context; it is never
/// shared between concurrent renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    namespace: Option<String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn depth(&self) -> usize {
        namespace_depth(self.namespace())
    }

    pub fn namespace_input_name(&self, input_name: &str) -> String {
        namespace_input_name(input_name, self.namespace())
    }

    pub fn namespace_input_id(&self, input_id: &str) -> String {
        format_input_id(&self.namespace_input_name(input_id))
    }

    /// Switch to `namespace` until the returned scope is dropped
    pub fn enter(&mut self, namespace: impl Into<String>) -> NamespaceScope<'_> {
        let previous = self.namespace.replace(namespace.into());
        NamespaceScope {
            context: self,
            previous,
        }
    }
}

/// Restores the previous namespace when dropped, including on early returns
#[derive(Debug)]
pub struct NamespaceScope<'a> {
    context: &'a mut RenderContext,
    previous: Option<String>,
}

impl Deref for NamespaceScope<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.context
    }
}

impl Drop for NamespaceScope<'_> {
    fn drop(&mut self) {
        self.context.namespace = self.previous.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("blocks", None, "blocks")]
    #[case("blocks", Some(""), "blocks")]
    #[case("blocks", Some("fields"), "fields[blocks]")]
    #[case("blocks[__NEOBLOCK__][fields]", Some("fields"), "fields[blocks][__NEOBLOCK__][fields]")]
    #[case("[x]", Some("fields"), "fields[x]")]
    fn test_namespace_input_name(
        #[case] name: &str,
        #[case] namespace: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(namespace_input_name(name, namespace), expected);
    }

    #[rstest]
    #[case("fields[blocks]", "fields-blocks")]
    #[case("fields[blocks][new1][fields]", "fields-blocks-new1-fields")]
    #[case("plain", "plain")]
    fn test_format_input_id(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(format_input_id(name), expected);
    }

    #[rstest]
    #[case(None, 0)]
    #[case(Some("fields"), 1)]
    #[case(Some("fields[matrix][blocks][new1][fields]"), 2)]
    #[case(Some("myfields[x]"), 0)]
    fn test_namespace_depth(#[case] namespace: Option<&str>, #[case] expected: usize) {
        assert_eq!(namespace_depth(namespace), expected);
    }

    #[test]
    fn test_scope_restores_namespace() {
        let mut ctx = RenderContext::with_namespace("fields");
        {
            let scope = ctx.enter("fields[blocks][__NEOBLOCK__][fields]");
            assert_eq!(scope.namespace(), Some("fields[blocks][__NEOBLOCK__][fields]"));
            assert_eq!(scope.depth(), 2);
        }
        assert_eq!(ctx.namespace(), Some("fields"));
    }

    #[test]
    fn test_scope_restores_on_error_path() {
        fn failing(ctx: &mut RenderContext) -> Result<(), String> {
            let _scope = ctx.enter("inner");
            Err("boom".to_string())
        }

        let mut ctx = RenderContext::new();
        assert!(failing(&mut ctx).is_err());
        assert_eq!(ctx.namespace(), None);
    }

    #[test]
    fn test_namespace_input_id() {
        let ctx = RenderContext::with_namespace("fields");
        assert_eq!(ctx.namespace_input_id("blocks"), "fields-blocks");
    }
}
