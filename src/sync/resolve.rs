use std::fmt;

use super::client::RemoteClient;
use crate::core::escape::xml_escape;
use crate::error::{SyncError, TransportError};

/// The two kinds of named Tracks resources an action can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Context,
    Project,
}

impl ResourceKind {
    /// XML element name of one resource.
    pub fn element(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Project => "project",
        }
    }

    /// Collection path relative to the Tracks base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Context => "contexts.xml",
            Self::Project => "projects.xml",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element())
    }
}

/// A context or project as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    pub id: u64,
    pub name: String,
}

/// Parse a `contexts.xml` / `projects.xml` listing.
///
/// Entries without a numeric id are skipped.
pub fn parse_resource_list(
    xml: &str,
    kind: ResourceKind,
    url: &str,
) -> Result<Vec<RemoteResource>, TransportError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| TransportError::InvalidXml {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let root = doc.root_element();
    let nodes: Vec<roxmltree::Node> = if root.has_tag_name(kind.element()) {
        vec![root]
    } else {
        root.children()
            .filter(|n| n.has_tag_name(kind.element()))
            .collect()
    };

    let mut resources = Vec::new();
    for node in nodes {
        let child_text = |tag: &str| {
            node.children()
                .find(|c| c.has_tag_name(tag))
                .and_then(|c| c.text())
                .map(str::trim)
        };

        let id = child_text("id").and_then(|s| s.parse::<u64>().ok());
        let name = child_text("name").unwrap_or("");
        match id {
            Some(id) => resources.push(RemoteResource {
                id,
                name: name.to_string(),
            }),
            None => log::debug!("Skipping {} without id: {}", kind, name),
        }
    }

    Ok(resources)
}

/// First resource whose name matches case-insensitively.
pub fn find_by_name<'a>(resources: &'a [RemoteResource], name: &str) -> Option<&'a RemoteResource> {
    let wanted = name.to_lowercase();
    resources.iter().find(|r| r.name.to_lowercase() == wanted)
}

/// Resolve a requested context or project name to a Tracks id.
///
/// With no name, `fallback` is returned directly (the default context, or
/// `None` for "no project"). An unknown name is created when `create` is set,
/// rejected when `strict` is set, and otherwise replaced by `fallback`.
pub async fn resolve<C: RemoteClient>(
    client: &C,
    kind: ResourceKind,
    name: Option<&str>,
    create: bool,
    fallback: Option<u64>,
    strict: bool,
) -> Result<Option<u64>, SyncError> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(fallback);
    };

    let listing = client.get(kind.path()).await?;
    let resources = parse_resource_list(&listing, kind, &client.url(kind.path()))?;

    if let Some(found) = find_by_name(&resources, name) {
        log::debug!("Found {} '{}' with id {}", kind, found.name, found.id);
        return Ok(Some(found.id));
    }

    if create {
        let payload = format!(
            "<{tag}><name>{}</name></{tag}>",
            xml_escape(name),
            tag = kind.element()
        );
        let id = client.post(kind.path(), &payload).await?;
        log::info!("Created {} '{}' with id {}", kind, name, id);
        return Ok(Some(id));
    }

    if strict {
        return Err(SyncError::UnknownResource {
            kind,
            name: name.to_string(),
        });
    }

    log::info!("Unknown {} '{}', using fallback {:?}", kind, name, fallback);
    Ok(fallback)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory Tracks server recording every request.
    #[derive(Default)]
    pub(crate) struct FakeTracks {
        pub listings: HashMap<String, String>,
        pub next_id: u64,
        pub fail_posts: bool,
        pub gets: Mutex<Vec<String>>,
        pub posts: Mutex<Vec<(String, String)>>,
    }

    impl FakeTracks {
        pub fn with_listing(mut self, path: &str, xml: &str) -> Self {
            self.listings.insert(path.to_string(), xml.to_string());
            self
        }

        pub fn posts(&self) -> Vec<(String, String)> {
            self.posts.lock().unwrap().clone()
        }

        pub fn gets(&self) -> Vec<String> {
            self.gets.lock().unwrap().clone()
        }
    }

    impl RemoteClient for FakeTracks {
        fn url(&self, path: &str) -> String {
            format!("http://tracks.test/{}", path)
        }

        async fn get(&self, path: &str) -> Result<String, TransportError> {
            self.gets.lock().unwrap().push(path.to_string());
            self.listings
                .get(path)
                .cloned()
                .ok_or_else(|| TransportError::Status {
                    url: self.url(path),
                    status: 404,
                    headers: String::new(),
                })
        }

        async fn post(&self, path: &str, payload: &str) -> Result<u64, TransportError> {
            self.posts
                .lock()
                .unwrap()
                .push((path.to_string(), payload.to_string()));
            if self.fail_posts {
                return Err(TransportError::Status {
                    url: self.url(path),
                    status: 500,
                    headers: "x-runtime: 3\r\n".to_string(),
                });
            }
            Ok(self.next_id)
        }
    }

    pub(crate) const CONTEXTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<contexts type="array">
  <context>
    <created-at type="datetime">2009-01-01T00:00:00Z</created-at>
    <hide type="boolean">false</hide>
    <id type="integer">1</id>
    <name>Home</name>
    <position type="integer">1</position>
  </context>
  <context>
    <id type="integer">7</id>
    <name>Phone</name>
  </context>
  <context>
    <id type="integer">9</id>
    <name>phone</name>
  </context>
</contexts>"#;

    pub(crate) const PROJECTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<projects type="array">
  <project>
    <id type="integer">12</id>
    <name>Garden &amp; Yard</name>
    <default-context-id type="integer">1</default-context-id>
  </project>
</projects>"#;

    #[test]
    fn parse_listing() {
        let resources = parse_resource_list(CONTEXTS, ResourceKind::Context, "contexts.xml").unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(
            resources[0],
            RemoteResource {
                id: 1,
                name: "Home".to_string()
            }
        );

        let projects = parse_resource_list(PROJECTS, ResourceKind::Project, "projects.xml").unwrap();
        assert_eq!(projects[0].name, "Garden & Yard");
        assert_eq!(projects[0].id, 12);
    }

    #[test]
    fn parse_listing_skips_entries_without_id() {
        let xml = "<contexts><context><name>Orphan</name></context><context><id>3</id><name>Ok</name></context></contexts>";
        let resources = parse_resource_list(xml, ResourceKind::Context, "contexts.xml").unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].id, 3);
    }

    #[test]
    fn parse_listing_rejects_garbage() {
        assert!(matches!(
            parse_resource_list("<contexts>", ResourceKind::Context, "contexts.xml"),
            Err(TransportError::InvalidXml { .. })
        ));
    }

    #[test]
    fn first_case_insensitive_match_wins() {
        let resources = parse_resource_list(CONTEXTS, ResourceKind::Context, "contexts.xml").unwrap();
        assert_eq!(find_by_name(&resources, "PHONE").unwrap().id, 7);
        assert_eq!(find_by_name(&resources, "home").unwrap().id, 1);
        assert!(find_by_name(&resources, "Office").is_none());
    }

    #[tokio::test]
    async fn no_name_uses_fallback_without_requests() {
        let fake = FakeTracks::default();
        let ctx = resolve(&fake, ResourceKind::Context, None, false, Some(1), true).await.unwrap();
        assert_eq!(ctx, Some(1));
        let project = resolve(&fake, ResourceKind::Project, None, true, None, true).await.unwrap();
        assert_eq!(project, None);
        assert!(fake.gets().is_empty());
        assert!(fake.posts().is_empty());
    }

    #[tokio::test]
    async fn existing_context_is_found_without_post() {
        let fake = FakeTracks::default().with_listing("contexts.xml", CONTEXTS);
        let id = resolve(&fake, ResourceKind::Context, Some("Home"), true, Some(1), false)
            .await
            .unwrap();
        assert_eq!(id, Some(1));
        assert_eq!(fake.gets(), vec!["contexts.xml"]);
        assert!(fake.posts().is_empty());
    }

    #[tokio::test]
    async fn unknown_context_falls_back_when_lenient() {
        let fake = FakeTracks::default().with_listing("contexts.xml", CONTEXTS);
        let id = resolve(&fake, ResourceKind::Context, Some("Office"), false, Some(1), false)
            .await
            .unwrap();
        assert_eq!(id, Some(1));
        assert!(fake.posts().is_empty());
    }

    #[tokio::test]
    async fn unknown_project_is_no_project_when_lenient() {
        let fake = FakeTracks::default().with_listing("projects.xml", PROJECTS);
        let id = resolve(&fake, ResourceKind::Project, Some("Project X"), false, None, false)
            .await
            .unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn unknown_name_is_an_error_when_strict() {
        let fake = FakeTracks::default().with_listing("projects.xml", PROJECTS);
        let err = resolve(&fake, ResourceKind::Project, Some("Project X"), false, None, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown project: Project X");
        assert!(fake.posts().is_empty());
    }

    #[tokio::test]
    async fn missing_resource_is_created_with_escaped_name() {
        let fake = FakeTracks {
            next_id: 42,
            ..FakeTracks::default()
        }
        .with_listing("contexts.xml", CONTEXTS);
        let id = resolve(&fake, ResourceKind::Context, Some("Mom & Dad"), true, Some(1), true)
            .await
            .unwrap();
        assert_eq!(id, Some(42));
        assert_eq!(
            fake.posts(),
            vec![(
                "contexts.xml".to_string(),
                "<context><name>Mom &amp; Dad</name></context>".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn malformed_listing_reports_full_url() {
        let fake = FakeTracks::default().with_listing("contexts.xml", "<contexts><context>");
        let err = resolve(&fake, ResourceKind::Context, Some("Home"), false, Some(1), false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Transport(TransportError::InvalidXml { ref url, .. })
                if url == "http://tracks.test/contexts.xml"
        ));
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let fake = FakeTracks::default();
        let err = resolve(&fake, ResourceKind::Context, Some("Home"), false, Some(1), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(TransportError::Status { status: 404, .. })));
    }
}
