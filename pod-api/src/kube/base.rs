use kube::api::ListParams;

/// Selector state shared by resource accessors
///
/// Selectors are stored verbatim and applied to every list call.
/// An empty string clears a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Base {
    label_selector: Option<String>,
    field_selector: Option<String>,
}

impl Base {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_label_selector(&mut self, selector: &str) {
        self.label_selector = non_empty(selector);
    }

    pub fn set_field_selector(&mut self, selector: &str) {
        self.field_selector = non_empty(selector);
    }

    pub fn label_selector(&self) -> Option<&str> {
        self.label_selector.as_deref()
    }

    pub fn field_selector(&self) -> Option<&str> {
        self.field_selector.as_deref()
    }

    pub fn has_selectors(&self) -> bool {
        self.label_selector.is_some() || self.field_selector.is_some()
    }

    /// List options carrying exactly the configured selectors
    pub fn list_params(&self) -> ListParams {
        let mut params = ListParams::default();
        if let Some(labels) = &self.label_selector {
            params = params.labels(labels);
        }
        if let Some(fields) = &self.field_selector {
            params = params.fields(fields);
        }
        params
    }
}

fn non_empty(selector: &str) -> Option<String> {
    (!selector.is_empty()).then(|| selector.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_starts_without_selectors() {
        let base = Base::new();
        assert!(!base.has_selectors());

        let params = base.list_params();
        assert!(params.label_selector.is_none());
        assert!(params.field_selector.is_none());
    }

    #[test]
    fn test_selectors_applied_verbatim() {
        let mut base = Base::new();
        base.set_label_selector("app=web, tier in (frontend)");
        base.set_field_selector("status.phase!=Failed");

        assert!(base.has_selectors());

        let params = base.list_params();
        assert_eq!(
            params.label_selector.as_deref(),
            Some("app=web, tier in (frontend)")
        );
        assert_eq!(params.field_selector.as_deref(), Some("status.phase!=Failed"));
    }

    #[test]
    fn test_empty_selector_clears() {
        let mut base = Base::new();
        base.set_label_selector("app=web");
        base.set_label_selector("");

        assert_eq!(base.label_selector(), None);
        assert!(!base.has_selectors());
    }

    #[test]
    fn test_field_selector_alone_counts() {
        let mut base = Base::new();
        base.set_field_selector("spec.nodeName=node-1");

        assert!(base.has_selectors());
        assert_eq!(base.label_selector(), None);
        assert_eq!(base.field_selector(), Some("spec.nodeName=node-1"));
    }
}
