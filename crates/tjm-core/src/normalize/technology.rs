use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{squash_whitespace, title_case};
use crate::models::TechnologySet;

/// Lowercase alias -> canonical name.
const SYNONYMS: &[(&str, &str)] = &[
    // languages
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("js", "JavaScript"),
    ("typescript", "TypeScript"),
    ("ts", "TypeScript"),
    ("java", "Java"),
    ("c#", "C#"),
    ("csharp", "C#"),
    ("c++", "C++"),
    ("cpp", "C++"),
    ("php", "PHP"),
    ("ruby", "Ruby"),
    ("go", "Go"),
    ("golang", "Go"),
    ("rust", "Rust"),
    ("kotlin", "Kotlin"),
    ("swift", "Swift"),
    ("scala", "Scala"),
    ("clojure", "Clojure"),
    // frameworks
    ("react", "React"),
    ("reactjs", "React"),
    ("react.js", "React"),
    ("vue", "Vue.js"),
    ("vuejs", "Vue.js"),
    ("vue.js", "Vue.js"),
    ("angular", "Angular"),
    ("angularjs", "AngularJS"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("spring", "Spring"),
    ("spring boot", "Spring Boot"),
    ("springboot", "Spring Boot"),
    ("express", "Express.js"),
    ("expressjs", "Express.js"),
    ("node", "Node.js"),
    ("nodejs", "Node.js"),
    ("node.js", "Node.js"),
    ("nextjs", "Next.js"),
    ("next.js", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("nuxtjs", "Nuxt.js"),
    (".net", ".NET"),
    ("dotnet", ".NET"),
    // databases
    ("postgresql", "PostgreSQL"),
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("mongo", "MongoDB"),
    ("redis", "Redis"),
    ("elasticsearch", "Elasticsearch"),
    ("cassandra", "Cassandra"),
    ("oracle", "Oracle"),
    ("sql server", "SQL Server"),
    ("sqlserver", "SQL Server"),
    ("sqlite", "SQLite"),
    ("sql", "SQL"),
    // cloud and devops
    ("aws", "AWS"),
    ("amazon web services", "AWS"),
    ("azure", "Azure"),
    ("gcp", "Google Cloud"),
    ("google cloud", "Google Cloud"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("k8s", "Kubernetes"),
    ("terraform", "Terraform"),
    ("ansible", "Ansible"),
    ("jenkins", "Jenkins"),
    ("gitlab ci", "GitLab CI"),
    ("github actions", "GitHub Actions"),
    ("kafka", "Kafka"),
    ("spark", "Spark"),
    // frontend
    ("html", "HTML"),
    ("html5", "HTML"),
    ("css", "CSS"),
    ("css3", "CSS"),
    ("sass", "Sass"),
    ("scss", "SCSS"),
    ("less", "Less"),
    ("tailwind", "Tailwind CSS"),
    ("tailwindcss", "Tailwind CSS"),
    ("bootstrap", "Bootstrap"),
    ("material-ui", "Material-UI"),
    ("mui", "Material-UI"),
    // tools
    ("git", "Git"),
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("jira", "Jira"),
    ("confluence", "Confluence"),
    ("slack", "Slack"),
    ("teams", "Microsoft Teams"),
];

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s.+#-]").unwrap());

/// Normalize one technology token. Returns `None` when nothing is left after
/// cleaning.
pub fn normalize_technology(token: &str) -> Option<String> {
    let cleaned = squash_whitespace(&DISALLOWED.replace_all(token, ""));
    if cleaned.is_empty() {
        return None;
    }

    let lower = cleaned.to_lowercase();
    let canonical = SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, name)| (*name).to_string());
    Some(canonical.unwrap_or_else(|| title_case(&cleaned)))
}

/// Normalize a raw technologies field: a JSON list of strings or a comma /
/// semicolon separated string. Anything else yields an empty set.
pub fn normalize_technologies(raw: &Value, cap: usize) -> TechnologySet {
    let tokens: Vec<&str> = match raw {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(s) => s.split([',', ';']).collect(),
        _ => Vec::new(),
    };
    TechnologySet::new(tokens.into_iter().filter_map(normalize_technology), cap)
}
