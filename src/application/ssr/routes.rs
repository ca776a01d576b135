//! Static page route table.

use std::collections::BTreeMap;

/// Page components the application shell can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    ArticleList,
    ArticleDetail,
    ArticleAdmin,
    NotFound,
}

impl Component {
    pub fn name(self) -> &'static str {
        match self {
            Self::ArticleList => "ArticleList",
            Self::ArticleDetail => "ArticleDetail",
            Self::ArticleAdmin => "ArticleAdmin",
            Self::NotFound => "NotFound",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(&'static str),
    Param(&'static str),
}

/// A path pattern such as `/article/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: &'static str,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: &'static str) -> Self {
        let segments = split_segments(raw)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name),
                None => Segment::Static(segment),
            })
            .collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &'static str {
        self.raw
    }

    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut params = RouteParams::default();
        let mut requested = split_segments(path);

        for segment in &self.segments {
            let value = requested.next()?;
            match segment {
                Segment::Static(expected) if *expected == value => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.0.insert((*name).to_string(), value.to_string());
                }
            }
        }

        requested.next().is_none().then_some(params)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Parameters extracted from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub pattern: &'static str,
    pub params: RouteParams,
    pub component: Component,
}

/// Ordered, immutable table of page routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(RoutePattern, Component)>,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = (&'static str, Component)>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(pattern, component)| (RoutePattern::parse(pattern), component))
                .collect(),
        }
    }

    /// The blog's page routes.
    pub fn standard() -> Self {
        Self::new([
            ("/", Component::ArticleList),
            ("/article/:id", Component::ArticleDetail),
            ("/admin", Component::ArticleAdmin),
        ])
    }

    /// Every route matching `path`, in table order. Empty when nothing matches.
    pub fn resolve(&self, path: &str) -> Vec<RouteMatch> {
        self.routes
            .iter()
            .filter_map(|(pattern, component)| {
                pattern.matches(path).map(|params| RouteMatch {
                    pattern: pattern.as_str(),
                    params,
                    component: *component,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_route_extracts_id() {
        let matches = RouteTable::standard().resolve("/article/42");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].component, Component::ArticleDetail);
        assert_eq!(matches[0].pattern, "/article/:id");
        assert_eq!(matches[0].params.get("id"), Some("42"));
    }

    #[test]
    fn root_matches_only_the_list() {
        let matches = RouteTable::standard().resolve("/");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].component, Component::ArticleList);
        assert!(matches[0].params.is_empty());
    }

    #[test]
    fn trailing_slash_and_query_are_tolerated() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/admin/")[0].component, Component::ArticleAdmin);
        assert_eq!(
            table.resolve("/article/7?ref=feed")[0].params.get("id"),
            Some("7")
        );
    }

    #[test]
    fn unknown_paths_yield_no_matches() {
        let table = RouteTable::standard();
        assert!(table.resolve("/nonexistent-page").is_empty());
        assert!(table.resolve("/article").is_empty());
        assert!(table.resolve("/article/1/comments").is_empty());
    }
}
