use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::{PackageSpec, RegistryUser};

/// Body of an access or publish check sent by the registry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PackageCheckRequest {
    pub user: RegistryUser,
    pub package: PackageSpec,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    /// `false` when the package is not handled by this plugin.
    pub allowed: bool,
}
