//! Path normalization
//!
//! Rewrites dynamic-looking URL segments (ids, hashes, UUIDs, timestamps,
//! image dimensions) into fixed placeholder tokens so that per-request metrics
//! aggregate by route shape instead of by individual resource.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

/// Built-in rule set, compiled once per process.
static IDISH: LazyLock<PathNormalizer> = LazyLock::new(PathNormalizer::idish);

/// Normalize a raw request path with the built-in rule set.
///
/// ```
/// use reqstats_core::replace_idish;
///
/// assert_eq!(replace_idish("/users/1234567/profile"), "/users/:int/profile");
/// assert_eq!(replace_idish("/img/300x200/banner"), "/img/:imgdim/banner");
/// ```
pub fn replace_idish(path: &str) -> String {
    IDISH.normalize(path)
}

/// Where a rule's pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Every non-overlapping match anywhere in the path.
    Anywhere,
    /// A whole `/`-delimited segment.
    Segment,
    /// Two or more consecutive whole segments, collapsed into one.
    SegmentRun,
}

/// A single rewrite step: a pattern and the token that replaces its matches.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    token: String,
    scope: Scope,
}

impl Rule {
    /// Replace every match of `pattern` anywhere in the path.
    pub fn anywhere(pattern: &str, token: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            token: token.into(),
            scope: Scope::Anywhere,
        })
    }

    /// Replace any segment that `pattern` matches in full.
    pub fn segment(pattern: &str, token: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: anchored(pattern)?,
            token: token.into(),
            scope: Scope::Segment,
        })
    }

    /// Collapse a run of two or more consecutive segments that `pattern`
    /// matches in full into a single token segment.
    pub fn segment_run(pattern: &str, token: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: anchored(pattern)?,
            token: token.into(),
            scope: Scope::SegmentRun,
        })
    }

    /// Replacement token written in place of a match.
    pub fn token(&self) -> &str {
        &self.token
    }

    fn apply(&self, path: &str) -> String {
        match self.scope {
            Scope::Anywhere => self
                .pattern
                .replace_all(path, NoExpand(&self.token))
                .into_owned(),
            Scope::Segment => path
                .split('/')
                .map(|seg| {
                    if self.pattern.is_match(seg) {
                        self.token.as_str()
                    } else {
                        seg
                    }
                })
                .collect::<Vec<_>>()
                .join("/"),
            Scope::SegmentRun => self.collapse_runs(path),
        }
    }

    fn collapse_runs(&self, path: &str) -> String {
        let segments: Vec<&str> = path.split('/').collect();
        let mut out: Vec<&str> = Vec::with_capacity(segments.len());

        let mut i = 0;
        while i < segments.len() {
            let run = segments[i..]
                .iter()
                .take_while(|seg| self.pattern.is_match(seg))
                .count();

            if run >= 2 {
                out.push(&self.token);
                i += run;
            } else {
                out.push(segments[i]);
                i += 1;
            }
        }

        out.join("/")
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// An ordered chain of rewrite rules.
///
/// Rules run in sequence over the lower-cased path; each sees the output of
/// the previous one, so specific shapes (message ids, hex paths, SHA-1, UUID)
/// must precede the generic digit and hex rules.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    rules: Vec<Rule>,
}

impl PathNormalizer {
    /// Build a normalizer from a custom, ordered rule list.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in rule set.
    pub fn idish() -> Self {
        let rules = vec![
            Rule::segment(r"[a-z0-9.\-]+@[a-z0-9.\-]+", ":msgid"),
            Rule::segment_run(r"[0-9a-f]+", ":hexpath"),
            Rule::anywhere(r"[0-9a-f]{40}", ":sha1"),
            Rule::anywhere(
                r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
                ":uuid",
            ),
            Rule::anywhere(r"[0-9]{6,}", ":int"),
            Rule::anywhere(r"[0-9]+x[0-9]+", ":imgdim"),
            Rule::segment(r"[0-9]+", ":int"),
            Rule::segment(r"[^/]{55,}", ":long"),
            Rule::segment(r"[0-9a-f\-]{8,}", ":hex"),
        ];

        Self::with_rules(
            rules
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .expect("built-in path rules are valid patterns"),
        )
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Lower-case `path` and run it through every rule in order.
    ///
    /// Total: a path no rule matches comes back lower-cased and otherwise
    /// unchanged.
    pub fn normalize(&self, path: &str) -> String {
        self.rules
            .iter()
            .fold(path.to_lowercase(), |acc, rule| rule.apply(&acc))
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::idish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_examples() {
        assert_eq!(replace_idish("/users/1234567/profile"), "/users/:int/profile");
        assert_eq!(
            replace_idish("/files/da39a3ee5e6b4b0d3255bfef95601890afd80709"),
            "/files/:sha1"
        );
        assert_eq!(replace_idish("/img/300x200/banner"), "/img/:imgdim/banner");
        assert_eq!(
            replace_idish("/order/550e8400-e29b-41d4-a716-446655440000"),
            "/order/:uuid"
        );
    }

    #[test]
    fn test_empty_and_static_paths() {
        assert_eq!(replace_idish(""), "");
        assert_eq!(replace_idish("/"), "/");
        assert_eq!(replace_idish("/health"), "/health");
        assert_eq!(replace_idish("/users/"), "/users/");
    }

    #[test]
    fn test_paths_without_leading_separator() {
        assert_eq!(replace_idish("12345"), ":int");
        assert_eq!(replace_idish("ab/cd"), ":hexpath");
        assert_eq!(replace_idish("users/42"), "users/:int");
        assert_eq!(replace_idish("users/42/"), "users/:int/");
    }

    #[test]
    fn test_rule_order_outcomes() {
        // Long digit runs become :int before the image-dimension rule runs.
        assert_eq!(replace_idish("/img/1234567x200/banner"), "/img/:intx200/banner");
        // Adjacent numeric or short hex segments form a hex path.
        assert_eq!(replace_idish("/users/42/7"), "/users/:hexpath");
        assert_eq!(replace_idish("/a/b"), "/:hexpath");
    }

    #[test]
    fn test_lowercases_whole_path() {
        assert_eq!(replace_idish("/Users/Profile"), "/users/profile");
        assert_eq!(
            replace_idish("/files/DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"),
            "/files/:sha1"
        );
    }

    #[test]
    fn test_msgid() {
        assert_eq!(
            replace_idish("/messages/1a2b.3c-4d@mail.example.com/raw"),
            "/messages/:msgid/raw"
        );
    }

    #[test]
    fn test_hexpath_collapses_runs() {
        assert_eq!(replace_idish("/static/ab/cd/ef01/app.js"), "/static/:hexpath/app.js");
        assert_eq!(replace_idish("/v/12/34"), "/v/:hexpath");
        // Two runs separated by a non-hex segment stay separate.
        assert_eq!(
            replace_idish("/ab/cd/xyz/12/ef"),
            "/:hexpath/xyz/:hexpath"
        );
    }

    #[test]
    fn test_single_hex_segment_is_not_hexpath() {
        assert_eq!(replace_idish("/users/42/profile"), "/users/:int/profile");
    }

    #[test]
    fn test_sha1_anywhere() {
        let sha = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
        assert_eq!(replace_idish(&format!("/blob/{}.tar.gz", sha)), "/blob/:sha1.tar.gz");
    }

    #[test]
    fn test_digit_runs() {
        assert_eq!(replace_idish("/report-20240115120000"), "/report-:int");
        assert_eq!(replace_idish("/page/7"), "/page/:int");
        assert_eq!(replace_idish("/v2/items"), "/v2/items");
        assert_eq!(replace_idish("/p1/1/x/2"), "/p1/:int/x/:int");
    }

    #[test]
    fn test_imgdim() {
        assert_eq!(replace_idish("/thumb/64x64.png"), "/thumb/:imgdim.png");
        assert_eq!(replace_idish("/img/1920x1080/banner"), "/img/:imgdim/banner");
    }

    #[test]
    fn test_long_segment() {
        let long = "q".repeat(55);
        assert_eq!(replace_idish(&format!("/token/{}", long)), "/token/:long");

        let short = "q".repeat(54);
        assert_eq!(
            replace_idish(&format!("/token/{}", short)),
            format!("/token/{}", short)
        );
    }

    #[test]
    fn test_hex_segment() {
        assert_eq!(replace_idish("/session/deadbeef/view"), "/session/:hex/view");
        assert_eq!(replace_idish("/session/dead-beef/view"), "/session/:hex/view");
        // Seven characters is too short.
        assert_eq!(replace_idish("/session/dead-be/view"), "/session/dead-be/view");
    }

    #[test]
    fn test_specific_rules_win_over_generic() {
        // UUID must not degrade into :hex, SHA-1 must not degrade into :hex.
        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(replace_idish(&format!("/order/{}/items", id)), "/order/:uuid/items");
        assert_eq!(
            replace_idish("/commit/da39a3ee5e6b4b0d3255bfef95601890afd80709/diff"),
            "/commit/:sha1/diff"
        );
    }

    #[test]
    fn test_random_uuids_always_match() {
        for _ in 0..64 {
            let id = uuid::Uuid::new_v4().to_string().to_uppercase();
            assert_eq!(replace_idish(&format!("/r/{}", id)), "/r/:uuid");
        }
    }

    #[test]
    fn test_deterministic_and_stable() {
        let paths = [
            "/users/1234567/profile",
            "/static/ab/cd/app.js",
            "/order/550e8400-e29b-41d4-a716-446655440000",
            "/img/300x200/banner",
            "/messages/abc@example.com",
        ];
        for path in paths {
            let once = replace_idish(path);
            assert_eq!(once, replace_idish(path));
            assert_eq!(once, replace_idish(&once));
        }
    }

    #[test]
    fn test_custom_rules() {
        let normalizer = PathNormalizer::with_rules(vec![
            Rule::segment(r"v[0-9]+", ":version").unwrap(),
        ]);
        assert_eq!(normalizer.normalize("/API/V3/users"), "/api/:version/users");
        assert_eq!(normalizer.rules().len(), 1);
        assert_eq!(normalizer.rules()[0].token(), ":version");
    }

    #[test]
    fn test_invalid_custom_pattern() {
        assert!(Rule::anywhere("(unclosed", ":x").is_err());
    }
}
