//! Per-format resource extraction from unified diffs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, trace};

use super::heuristics::{ChangeHeuristics, WindowHeuristics, truncate_chars};
use super::types::{FileChange, IacFormat, Operation, ResourceChange};

/// Maximum diff characters kept for a resource that matched no declaration.
pub const GENERIC_DIFF_MAX_CHARS: usize = 500;

static TERRAFORM_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"resource\s+"([^"]+)"\s+"([^"]+)""#).expect("valid terraform regex")
});

static K8S_KIND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"kind:\s*(\S+)").expect("valid kind regex"));

static K8S_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"name:\s*(\S+)").expect("valid name regex"));

// Logical id on one line, `Type: AWS::...` on the next. Either line may carry
// a diff marker.
static CFN_YAML_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][A-Za-z0-9]+):\s*\n[+\-]?\s*Type:\s*(AWS::\S+)")
        .expect("valid cloudformation yaml regex")
});

static CFN_JSON_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)":\s*\{[\s+\-]*"Type":\s*"(AWS::[^"]+)""#)
        .expect("valid cloudformation json regex")
});

/// Turns per-file diffs into structured resource changes.
#[derive(Debug, Clone, Default)]
pub struct DiffAnalyzer<H = WindowHeuristics> {
    heuristics: H,
}

impl DiffAnalyzer {
    /// Creates an analyzer with the standard window heuristics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heuristics: WindowHeuristics::new(),
        }
    }
}

impl<H: ChangeHeuristics> DiffAnalyzer<H> {
    /// Creates an analyzer with custom heuristics.
    #[must_use]
    pub const fn with_heuristics(heuristics: H) -> Self {
        Self { heuristics }
    }

    /// Analyzes the diff of one file.
    ///
    /// An empty diff yields no resources. A non-empty diff in which no
    /// declaration is found yields exactly one `unknown` resource named after
    /// the file.
    #[must_use]
    pub fn analyze(&self, format: IacFormat, file_path: &str, diff: &str) -> FileChange {
        let resources = if diff.is_empty() {
            Vec::new()
        } else {
            let found = match format {
                IacFormat::Terraform => self.extract_terraform(diff),
                IacFormat::Kubernetes => self.extract_kubernetes(diff),
                IacFormat::Cloudformation => self.extract_cloudformation(diff),
            };
            if found.is_empty() {
                debug!("No {format} declaration found in {file_path}, recording generic change");
                vec![self.generic_change(file_path, diff)]
            } else {
                found
            }
        };

        FileChange {
            file: file_path.to_string(),
            format,
            resources,
        }
    }

    /// Extracts `resource "type" "name"` blocks.
    #[must_use]
    pub fn extract_terraform(&self, diff: &str) -> Vec<ResourceChange> {
        TERRAFORM_RESOURCE
            .captures_iter(diff)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(self.resource_at(diff, whole.start(), &caps[1], &caps[2]))
            })
            .collect()
    }

    /// Extracts `kind:` declarations, each named by the first `name:` after it.
    #[must_use]
    pub fn extract_kubernetes(&self, diff: &str) -> Vec<ResourceChange> {
        let names: Vec<(usize, &str)> = K8S_NAME
            .captures_iter(diff)
            .filter_map(|caps| caps.get(0).zip(caps.get(1)))
            .map(|(whole, name)| (whole.start(), name.as_str()))
            .collect();

        K8S_KIND
            .captures_iter(diff)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let position = whole.start();
                let name = names
                    .iter()
                    .find(|(start, _)| *start > position)
                    .map_or("unnamed", |(_, name)| name);
                trace!("Kubernetes {} at {position} named {name}", &caps[1]);
                Some(self.resource_at(diff, position, &caps[1], name))
            })
            .collect()
    }

    /// Extracts `LogicalId: Type: AWS::...` declarations. The JSON form is
    /// only tried when the YAML form finds nothing.
    #[must_use]
    pub fn extract_cloudformation(&self, diff: &str) -> Vec<ResourceChange> {
        let collect = |re: &Regex| -> Vec<ResourceChange> {
            re.captures_iter(diff)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    Some(self.resource_at(diff, whole.start(), &caps[2], &caps[1]))
                })
                .collect()
        };

        let yaml = collect(&*CFN_YAML_RESOURCE);
        if yaml.is_empty() {
            collect(&*CFN_JSON_RESOURCE)
        } else {
            yaml
        }
    }

    fn resource_at(
        &self,
        diff: &str,
        position: usize,
        resource_type: &str,
        name: &str,
    ) -> ResourceChange {
        ResourceChange {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            operation: self.heuristics.operation(diff, position),
            attributes_changed: self.heuristics.attributes(diff, position),
            diff: self.heuristics.snippet(diff, position),
        }
    }

    fn generic_change(&self, file_path: &str, diff: &str) -> ResourceChange {
        let path = Path::new(file_path);
        let name = path
            .file_stem()
            .map_or_else(|| file_path.to_string(), |s| s.to_string_lossy().into_owned());

        ResourceChange {
            resource_type: String::from("unknown"),
            name,
            operation: Operation::Modify,
            attributes_changed: self.heuristics.attributes(diff, 0),
            diff: truncate_chars(diff, GENERIC_DIFF_MAX_CHARS).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TF_MODIFY: &str = "\
diff --git a/infra/main.tf b/infra/main.tf
@@ -10,7 +10,7 @@
 resource \"aws_instance\" \"web\" {
   ami           = \"ami-123\"
-  instance_type = \"t3.micro\"
+  instance_type = \"t3.large\"
 }
";

    #[test]
    fn test_terraform_modify() {
        let change = DiffAnalyzer::new().analyze(IacFormat::Terraform, "infra/main.tf", TF_MODIFY);

        assert_eq!(change.format, IacFormat::Terraform);
        assert_eq!(change.resources.len(), 1);
        let resource = &change.resources[0];
        assert_eq!(resource.address(), "aws_instance.web");
        assert_eq!(resource.operation, Operation::Modify);
        assert_eq!(resource.attributes_changed, vec!["instance_type"]);
        assert!(resource.diff.contains("t3.large"));
    }

    #[test]
    fn test_terraform_multiple_resources() {
        let diff = "\
+resource \"aws_s3_bucket\" \"logs\" {
+  bucket = \"logs\"
+}
+resource \"aws_kms_key\" \"main\" {
+  enable_key_rotation = true
+}
";
        let resources = DiffAnalyzer::new().extract_terraform(diff);
        let addresses: Vec<_> = resources.iter().map(ResourceChange::address).collect();
        assert_eq!(addresses, vec!["aws_s3_bucket.logs", "aws_kms_key.main"]);
        assert!(resources.iter().all(|r| r.operation == Operation::Create));
    }

    #[test]
    fn test_kubernetes_name_follows_kind() {
        let diff = "\
 apiVersion: apps/v1
 kind: Deployment
 metadata:
   name: api
 spec:
-  replicas: 2
+  replicas: 3
";
        let change = DiffAnalyzer::new().analyze(IacFormat::Kubernetes, "k8s/api.yaml", diff);
        assert_eq!(change.resources.len(), 1);
        assert_eq!(change.resources[0].resource_type, "Deployment");
        assert_eq!(change.resources[0].name, "api");
        assert_eq!(change.resources[0].attributes_changed, vec!["replicas"]);
    }

    #[test]
    fn test_kubernetes_unnamed() {
        let diff = "+name: early\n+kind: ConfigMap\n+data:\n+  key: value\n";
        let resources = DiffAnalyzer::new().extract_kubernetes(diff);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "unnamed");
    }

    #[test]
    fn test_cloudformation_yaml() {
        let diff = "\
 Resources:
   LogBucket:
     Type: AWS::S3::Bucket
     Properties:
-      VersioningConfiguration: Suspended
+      VersioningConfiguration: Enabled
";
        let resources = DiffAnalyzer::new().extract_cloudformation(diff);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].resource_type, "AWS::S3::Bucket");
        assert_eq!(resources[0].name, "LogBucket");
    }

    #[test]
    fn test_cloudformation_yaml_added_lines() {
        let diff = "+  Queue:\n+    Type: AWS::SQS::Queue\n";
        let resources = DiffAnalyzer::new().extract_cloudformation(diff);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].address(), "AWS::SQS::Queue.Queue");
    }

    #[test]
    fn test_cloudformation_json_fallback() {
        let diff = "\
 \"Resources\": {
+  \"AppRole\": {
+    \"Type\": \"AWS::IAM::Role\",
+    \"Properties\": {}
+  }
";
        let resources = DiffAnalyzer::new().extract_cloudformation(diff);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].resource_type, "AWS::IAM::Role");
        assert_eq!(resources[0].name, "AppRole");
    }

    #[test]
    fn test_generic_fallback() {
        let diff = format!("+  retention_days = 30\n{}", "x".repeat(900));
        let change = DiffAnalyzer::new().analyze(IacFormat::Terraform, "infra/variables.tf", &diff);

        assert_eq!(change.resources.len(), 1);
        let resource = &change.resources[0];
        assert_eq!(resource.resource_type, "unknown");
        assert_eq!(resource.name, "variables");
        assert_eq!(resource.operation, Operation::Modify);
        assert_eq!(resource.attributes_changed, vec!["retention_days"]);
        assert_eq!(resource.diff.chars().count(), GENERIC_DIFF_MAX_CHARS);
    }

    #[test]
    fn test_empty_diff_has_no_resources() {
        let change = DiffAnalyzer::new().analyze(IacFormat::Kubernetes, "k8s/a.yaml", "");
        assert!(change.resources.is_empty());
        assert_eq!(change.file, "k8s/a.yaml");
    }

    #[test]
    fn test_deterministic() {
        let analyzer = DiffAnalyzer::new();
        let first = analyzer.analyze(IacFormat::Terraform, "main.tf", TF_MODIFY);
        let second = analyzer.analyze(IacFormat::Terraform, "main.tf", TF_MODIFY);
        assert_eq!(first, second);
    }

    struct AlwaysDelete;

    impl ChangeHeuristics for AlwaysDelete {
        fn operation(&self, _diff: &str, _position: usize) -> Operation {
            Operation::Delete
        }

        fn attributes(&self, _diff: &str, position: usize) -> Vec<String> {
            vec![format!("at_{position}")]
        }

        fn snippet(&self, _diff: &str, _position: usize) -> String {
            String::from("stub")
        }
    }

    #[test]
    fn test_custom_heuristics_are_used() {
        let analyzer = DiffAnalyzer::with_heuristics(AlwaysDelete);
        let change = analyzer.analyze(IacFormat::Terraform, "infra/main.tf", TF_MODIFY);

        assert_eq!(change.resources.len(), 1);
        let resource = &change.resources[0];
        assert_eq!(resource.address(), "aws_instance.web");
        assert_eq!(resource.operation, Operation::Delete);
        let position = TF_MODIFY.find("resource").unwrap();
        assert_eq!(resource.attributes_changed, vec![format!("at_{position}")]);
        assert_eq!(resource.diff, "stub");

        let generic = analyzer.analyze(IacFormat::Terraform, "vars.tf", "+  retention_days = 30\n");
        assert_eq!(generic.resources[0].operation, Operation::Modify);
        assert_eq!(generic.resources[0].attributes_changed, vec!["at_0"]);
    }
}
