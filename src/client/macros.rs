//! Link-time registry of client backends.
//!
//! Each backend module invokes [`register_client!`](crate::register_client)
//! once. The entries are gathered into [`CLIENT_REGISTRY`] at link time, so
//! [`create_client`](super::create_client) can resolve a URI scheme without a
//! hand-maintained list of backends.

use super::{ClientInfo, SecretsManagerClient};
use crate::Result;
use secretsmanager_loader_core::LoaderSettings;
use url::Url;

/// Builds a client from a normalized URI and the loader settings.
pub type ClientConstructor = fn(&Url, &LoaderSettings) -> Result<Box<dyn SecretsManagerClient>>;

/// One registered backend.
#[doc(hidden)]
pub struct ClientRegistration {
    pub info: ClientInfo,
    pub schemes: &'static [&'static str],
    pub factory: ClientConstructor,
}

impl ClientRegistration {
    /// Whether this backend serves URIs with `scheme`.
    pub fn handles(&self, scheme: &str) -> bool {
        self.schemes.contains(&scheme)
    }
}

#[doc(hidden)]
#[linkme::distributed_slice]
pub static CLIENT_REGISTRY: [ClientRegistration];

/// Registers a backend under one or more URI schemes.
///
/// `config` must provide `fn from_url(&Url, &LoaderSettings) -> Result<Self>`
/// and `struct` must provide `fn new(config) -> Self`. The macro also defines
/// `CLIENT_NAME` on the struct for use in
/// [`SecretsManagerClient::name`](super::SecretsManagerClient::name).
///
/// ```ignore
/// register_client! {
///     struct: FileClient,
///     config: FileConfig,
///     name: "file",
///     description: "Response envelopes stored as JSON files in a local directory",
///     schemes: ["file"],
///     examples: ["file:///srv/secrets"],
/// }
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! register_client {
    (
        struct: $client:ident,
        config: $config:ty,
        name: $name:expr,
        description: $description:expr,
        schemes: [$($scheme:expr),* $(,)?],
        examples: [$($example:expr),* $(,)?] $(,)?
    ) => {
        impl $client {
            const CLIENT_NAME: &'static str = $name;
        }

        const _: () = {
            fn construct(
                url: &::url::Url,
                settings: &$crate::LoaderSettings,
            ) -> $crate::Result<Box<dyn $crate::client::SecretsManagerClient>> {
                let config = <$config>::from_url(url, settings)?;
                Ok(Box::new(<$client>::new(config)))
            }

            #[linkme::distributed_slice($crate::client::CLIENT_REGISTRY)]
            static REGISTRATION: $crate::client::ClientRegistration =
                $crate::client::ClientRegistration {
                    info: $crate::client::ClientInfo {
                        name: $name,
                        description: $description,
                        examples: &[$($example,)*],
                    },
                    schemes: &[$($scheme,)*],
                    factory: construct,
                };
        };
    };
}
