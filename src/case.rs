//! Identifier case helpers: table names from model names, documentation tags.

/// Convert an identifier from CamelCase to snake_case.
/// e.g. "ServerLog" -> "server_log", "HTTPRequest" -> "http_request"
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Upper-case the first character, leave the rest untouched.
/// e.g. "users" -> "Users"
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split a CamelCase identifier into words. A run of capitals is kept together as an acronym,
/// except for its last letter when that letter starts a lowercase word.
/// e.g. "HTTPServerLog" -> ["HTTP", "Server", "Log"]
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if !prev.is_uppercase() || next_is_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Documentation tag for a route group: "{Category} - {Model Name Words}".
pub fn route_tag(category: &str, model_name: &str) -> String {
    format!("{} - {}", capitalize(category), split_words(model_name).join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_camel_case_and_acronyms() {
        assert_eq!(split_words("User"), vec!["User"]);
        assert_eq!(split_words("ServerLog"), vec!["Server", "Log"]);
        assert_eq!(split_words("HTTPServerLog"), vec!["HTTP", "Server", "Log"]);
        assert_eq!(split_words("APIKey"), vec!["API", "Key"]);
    }

    #[test]
    fn snake_case_table_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("WarehouseStock"), "warehouse_stock");
        assert_eq!(to_snake_case("HTTPRequest"), "http_request");
    }

    #[test]
    fn tags() {
        assert_eq!(route_tag("users", "User"), "Users - User");
        assert_eq!(route_tag("inventory", "WarehouseStock"), "Inventory - Warehouse Stock");
        assert_eq!(capitalize(""), "");
    }
}
