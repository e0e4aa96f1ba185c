// ABOUTME: Inventory datasets served by the backend
// ABOUTME: Maps each kind to its cache resource id, endpoint, parameters and auth requirement

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Ec2Instances,
    Ec2Volumes,
    Ec2Snapshots,
    Ec2LoadBalancers,
    Ec2SecurityGroups,
    Ec2Enis,
    Ec2Amis,
    Ec2Asgs,
    Ec2KeyPairs,
    AwsList,
    S3Details,
    AzureAccounts,
    AzureDetails,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Ec2Instances,
        ResourceKind::Ec2Volumes,
        ResourceKind::Ec2Snapshots,
        ResourceKind::Ec2LoadBalancers,
        ResourceKind::Ec2SecurityGroups,
        ResourceKind::Ec2Enis,
        ResourceKind::Ec2Amis,
        ResourceKind::Ec2Asgs,
        ResourceKind::Ec2KeyPairs,
        ResourceKind::AwsList,
        ResourceKind::S3Details,
        ResourceKind::AzureAccounts,
        ResourceKind::AzureDetails,
    ];

    /// Resource id used as the first cache key segment
    pub fn id(&self) -> &'static str {
        match self {
            ResourceKind::Ec2Instances => "ec2-instances",
            ResourceKind::Ec2Volumes => "ec2-volumes",
            ResourceKind::Ec2Snapshots => "ec2-snapshots",
            ResourceKind::Ec2LoadBalancers => "ec2-load-balancers",
            ResourceKind::Ec2SecurityGroups => "ec2-security-groups",
            ResourceKind::Ec2Enis => "ec2-enis",
            ResourceKind::Ec2Amis => "ec2-amis",
            ResourceKind::Ec2Asgs => "ec2-asgs",
            ResourceKind::Ec2KeyPairs => "ec2-key-pairs",
            ResourceKind::AwsList => "aws-list",
            ResourceKind::S3Details => "s3-details",
            ResourceKind::AzureAccounts => "azure-accounts",
            ResourceKind::AzureDetails => "azure-details",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Ec2Instances => "EC2 instances",
            ResourceKind::Ec2Volumes => "EBS volumes",
            ResourceKind::Ec2Snapshots => "EBS snapshots",
            ResourceKind::Ec2LoadBalancers => "Load balancers",
            ResourceKind::Ec2SecurityGroups => "Security groups",
            ResourceKind::Ec2Enis => "Network interfaces",
            ResourceKind::Ec2Amis => "AMIs",
            ResourceKind::Ec2Asgs => "Auto scaling groups",
            ResourceKind::Ec2KeyPairs => "Key pairs",
            ResourceKind::AwsList => "S3 buckets",
            ResourceKind::S3Details => "S3 bucket",
            ResourceKind::AzureAccounts => "Azure storage accounts",
            ResourceKind::AzureDetails => "Azure storage account",
        }
    }

    /// Endpoint path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Ec2Instances => "/aws/ec2/instances",
            ResourceKind::Ec2Volumes => "/aws/ec2/volumes",
            ResourceKind::Ec2Snapshots => "/aws/ec2/snapshots",
            ResourceKind::Ec2LoadBalancers => "/aws/ec2/load-balancers",
            ResourceKind::Ec2SecurityGroups => "/aws/ec2/security-groups",
            ResourceKind::Ec2Enis => "/aws/ec2/enis",
            ResourceKind::Ec2Amis => "/aws/ec2/amis",
            ResourceKind::Ec2Asgs => "/aws/ec2/asg",
            ResourceKind::Ec2KeyPairs => "/aws/ec2/key-pairs",
            ResourceKind::AwsList => "/aws/list",
            ResourceKind::S3Details => "/aws/details",
            ResourceKind::AzureAccounts => "/azure/list",
            ResourceKind::AzureDetails => "/azure/details",
        }
    }

    /// Query parameter names, in the order callers pass values
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::S3Details => &["bucket_name"],
            ResourceKind::AzureDetails => &["account_name", "resource_group"],
            _ => &[],
        }
    }

    /// Azure endpoints and S3 bucket details sit behind the API scope; the
    /// EC2 listings are open
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            ResourceKind::S3Details | ResourceKind::AzureAccounts | ResourceKind::AzureDetails
        )
    }

    pub fn check_params(&self, params: &[String]) -> ClientResult<()> {
        let expected = self.param_names().len();
        if params.len() != expected {
            return Err(ClientError::InvalidParams {
                resource: self.id(),
                expected,
                actual: params.len(),
            });
        }
        Ok(())
    }

    /// Full endpoint URL under `base_url` with `params` as query values
    pub fn url(&self, base_url: &str, params: &[String]) -> ClientResult<Url> {
        self.check_params(params)?;

        let raw = format!("{}{}", base_url.trim_end_matches('/'), self.path());
        let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in self.param_names().iter().zip(params) {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ResourceKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| ClientError::UnknownResource(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = "http://localhost:7071/api";

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.id().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!(matches!(
            "ec2-lambdas".parse::<ResourceKind>(),
            Err(ClientError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_plain_url() {
        let url = ResourceKind::Ec2Asgs.url(BASE, &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:7071/api/aws/ec2/asg");

        let url = ResourceKind::Ec2Instances.url("http://host/api/", &[]).unwrap();
        assert_eq!(url.as_str(), "http://host/api/aws/ec2/instances");
    }

    #[test]
    fn test_url_encodes_query_params() {
        let url = ResourceKind::AzureDetails
            .url(BASE, &params(&["prod store", "rg&1"]))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:7071/api/azure/details?account_name=prod+store&resource_group=rg%261"
        );

        let url = ResourceKind::S3Details.url(BASE, &params(&["logs"])).unwrap();
        assert_eq!(url.as_str(), "http://localhost:7071/api/aws/details?bucket_name=logs");
    }

    #[test]
    fn test_wrong_param_count() {
        let result = ResourceKind::S3Details.url(BASE, &[]);
        assert!(matches!(
            result,
            Err(ClientError::InvalidParams {
                expected: 1,
                actual: 0,
                ..
            })
        ));
        assert!(ResourceKind::Ec2Amis.url(BASE, &params(&["x"])).is_err());
    }

    #[test]
    fn test_bucket_details_and_azure_require_auth() {
        let authenticated: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(ResourceKind::requires_auth)
            .collect();
        assert_eq!(
            authenticated,
            vec![
                ResourceKind::S3Details,
                ResourceKind::AzureAccounts,
                ResourceKind::AzureDetails
            ]
        );
    }
}
