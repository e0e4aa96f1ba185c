// ABOUTME: Prompt construction and insight extraction for configuration summaries
// ABOUTME: Pure functions; the service decides when to fall back

use serde_json::Value;

pub const MAX_INSIGHTS: usize = 3;

/// Kind of resource being summarized; picks the prompt focus and offline advice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryTarget {
    StorageAccount,
    S3Bucket,
}

impl SummaryTarget {
    pub fn label(&self) -> &'static str {
        match self {
            SummaryTarget::StorageAccount => "Azure Storage Account",
            SummaryTarget::S3Bucket => "AWS S3 Bucket",
        }
    }

    fn details_heading(&self) -> &'static str {
        match self {
            SummaryTarget::StorageAccount => "Azure Storage Account Details",
            SummaryTarget::S3Bucket => "S3 Bucket Details",
        }
    }

    fn focus(&self) -> &'static [&'static str] {
        match self {
            SummaryTarget::StorageAccount => &[
                "Performance and tier optimization recommendations",
                "Security and access configuration analysis",
                "Cost optimization opportunities",
                "Best practices and configuration improvements",
            ],
            SummaryTarget::S3Bucket => &[
                "Security configuration and public access settings",
                "Data protection features (versioning, encryption, logging)",
                "Cost optimization opportunities",
                "Compliance and best practices recommendations",
            ],
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            SummaryTarget::StorageAccount => "storage account",
            SummaryTarget::S3Bucket => "bucket",
        }
    }

    fn generic_advice(&self) -> [&'static str; 2] {
        match self {
            SummaryTarget::StorageAccount => [
                "Review your access tier configuration to match actual usage patterns",
                "Consider implementing lifecycle management policies for cost optimization",
            ],
            SummaryTarget::S3Bucket => [
                "Review your public access settings to ensure data security",
                "Consider enabling versioning and lifecycle policies for data protection",
            ],
        }
    }
}

/// Prompt asking for 2-3 short numbered insights about `details`
pub fn build_prompt(target: SummaryTarget, details: &Value) -> String {
    let details_json =
        serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
    let focus: String = target
        .focus()
        .iter()
        .map(|line| format!("- {}\n", line))
        .collect();

    format!(
        "Analyze this {label} configuration and provide exactly 2-3 key insights \
(each insight should be one concise sentence under 20 words):

{heading}:
{details}

Focus on:
{focus}
Format your response as:
1. First insight here
2. Second insight here
3. Third insight here",
        label = target.label(),
        heading = target.details_heading(),
        details = details_json,
        focus = focus
    )
}

/// Numbered lines (`1.` or `1)`) with the numbering stripped, at most three
pub fn parse_insights(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(strip_numbering)
        .filter(|line| !line.is_empty())
        .take(MAX_INSIGHTS)
        .map(str::to_string)
        .collect()
}

fn strip_numbering(line: &str) -> Option<&str> {
    let line = line.trim();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map(str::trim)
}

/// Advice derived from the configuration alone, for when generation fails
pub fn fallback_insights(target: SummaryTarget, details: &Value) -> Vec<String> {
    let text = |field: &str, default: &'static str| -> String {
        details
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    match target {
        SummaryTarget::StorageAccount => vec![
            format!(
                "Storage account \"{}\" is using {} tier in {} region",
                text("name", "resource"),
                text("sku", "standard"),
                text("location", "unknown")
            ),
            "Review your replication settings to balance cost and redundancy needs".to_string(),
            "Consider enabling soft delete and versioning for data protection".to_string(),
        ],
        SummaryTarget::S3Bucket => {
            let blocks_public_acls = details
                .pointer("/public_access/BlockPublicAcls")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let versioning = details.get("versioning").and_then(Value::as_str) == Some("Enabled");
            let encrypted = details
                .pointer("/encryption/Rules")
                .is_some_and(|rules| !rules.is_null());

            vec![
                format!(
                    "Bucket \"{}\" in {} {}",
                    text("name", "bucket"),
                    text("region", "us-east-1"),
                    if blocks_public_acls {
                        "has strong security"
                    } else {
                        "needs security review"
                    }
                ),
                if versioning {
                    "Versioning enabled provides good data protection"
                } else {
                    "Enable versioning to protect against accidental deletions"
                }
                .to_string(),
                if encrypted {
                    "Encryption is active for data at rest"
                } else {
                    "Consider enabling server-side encryption for enhanced security"
                }
                .to_string(),
            ]
        }
    }
}

/// Generated text that had no numbered lines, padded with generic advice
pub(crate) fn unparsed_insights(text: &str, target: SummaryTarget, details: &Value) -> Vec<String> {
    let lead = match text.trim() {
        "" => {
            let name = details
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("resource");
            format!("{} {} analyzed successfully", name, target.noun())
        }
        trimmed => trimmed.to_string(),
    };

    let [first, second] = target.generic_advice();
    vec![lead, first.to_string(), second.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("1. Enable HTTPS only", Some("Enable HTTPS only"))]
    #[case("2) Move to cool tier", Some("Move to cool tier"))]
    #[case("   10.   Padded line  ", Some("Padded line"))]
    #[case("- bullet", None)]
    #[case("Intro text", None)]
    #[case("1 no separator", None)]
    fn test_strip_numbering(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(strip_numbering(line), expected);
    }

    #[test]
    fn test_parse_insights_keeps_at_most_three() {
        let text = "Here are the insights:\n1. First\n2) Second\n\n3. Third\n4. Fourth";
        assert_eq!(parse_insights(text), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_parse_insights_drops_empty_items() {
        assert_eq!(parse_insights("1.\n2. Real insight"), vec!["Real insight"]);
    }

    #[test]
    fn test_parse_insights_without_numbering() {
        assert!(parse_insights("Looks fine overall.").is_empty());
    }

    #[test]
    fn test_prompt_embeds_label_and_details() {
        let prompt = build_prompt(
            SummaryTarget::StorageAccount,
            &json!({"sku": "Standard_LRS"}),
        );
        assert!(prompt.starts_with("Analyze this Azure Storage Account configuration"));
        assert!(prompt.contains("Azure Storage Account Details:\n"));
        assert!(prompt.contains("\"sku\": \"Standard_LRS\""));
        assert!(prompt.contains("- Performance and tier optimization recommendations\n"));
        assert!(prompt.contains("exactly 2-3 key insights"));
        assert!(prompt.ends_with("3. Third insight here"));
    }

    #[test]
    fn test_bucket_prompt_focuses_on_data_protection() {
        let prompt = build_prompt(SummaryTarget::S3Bucket, &json!({"name": "logs"}));
        assert!(prompt.starts_with("Analyze this AWS S3 Bucket configuration"));
        assert!(prompt.contains("S3 Bucket Details:\n"));
        assert!(prompt.contains("- Security configuration and public access settings\n"));
        assert!(prompt.contains("- Data protection features (versioning, encryption, logging)\n"));
        assert!(prompt.contains("- Compliance and best practices recommendations\n"));
        assert!(!prompt.contains("tier optimization"));
    }

    #[test]
    fn test_fallback_uses_location_and_sku() {
        let insights = fallback_insights(
            SummaryTarget::StorageAccount,
            &json!({"name": "prodstore", "sku": "Standard_GRS", "location": "westeurope"}),
        );
        assert_eq!(insights.len(), 3);
        assert_eq!(
            insights[0],
            "Storage account \"prodstore\" is using Standard_GRS tier in westeurope region"
        );
    }

    #[test]
    fn test_fallback_defaults() {
        let insights = fallback_insights(SummaryTarget::StorageAccount, &json!({}));
        assert_eq!(
            insights[0],
            "Storage account \"resource\" is using standard tier in unknown region"
        );
    }

    #[test]
    fn test_bucket_fallback_for_protected_bucket() {
        let insights = fallback_insights(
            SummaryTarget::S3Bucket,
            &json!({
                "name": "logs",
                "region": "eu-west-1",
                "versioning": "Enabled",
                "encryption": {"Rules": [{"ApplyServerSideEncryptionByDefault": {"SSEAlgorithm": "AES256"}}]},
                "public_access": {"BlockPublicAcls": true}
            }),
        );
        assert_eq!(
            insights,
            vec![
                "Bucket \"logs\" in eu-west-1 has strong security",
                "Versioning enabled provides good data protection",
                "Encryption is active for data at rest",
            ]
        );
    }

    #[test]
    fn test_bucket_fallback_for_open_bucket() {
        let insights = fallback_insights(
            SummaryTarget::S3Bucket,
            &json!({"name": "uploads", "versioning": "Suspended", "encryption": null}),
        );
        assert_eq!(
            insights,
            vec![
                "Bucket \"uploads\" in us-east-1 needs security review",
                "Enable versioning to protect against accidental deletions",
                "Consider enabling server-side encryption for enhanced security",
            ]
        );
    }

    #[test]
    fn test_unparsed_text_leads() {
        let insights = unparsed_insights("  All good.  ", SummaryTarget::StorageAccount, &json!({}));
        assert_eq!(insights[0], "All good.");
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn test_unparsed_empty_bucket_text() {
        let insights = unparsed_insights("", SummaryTarget::S3Bucket, &json!({"name": "logs"}));
        assert_eq!(insights[0], "logs bucket analyzed successfully");
        assert_eq!(
            insights[1],
            "Review your public access settings to ensure data security"
        );
    }
}
