//! Named endpoints that live connections can be opened to

use crate::connection::ConnectionBuilder;
use serde::{Deserialize, Serialize};
use vbus_core::{DEFAULT_SELF_ADDRESS, VbusResult};
use vbus_session::{Connection, ReconnectPolicy};

/// Where live VBus data comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataSource {
    /// VBus/USB adapter or serial interface
    Serial { path: String },
    /// VBus/LAN adapter, data logger or VBus.net relay
    Tcp {
        address: String,
        #[serde(default)]
        via_tag: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

/// Per-connection options for [`DataSource::connect_live`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveOptions {
    pub channel: u8,
    pub self_address: u16,
    pub reconnect_policy: ReconnectPolicy,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            channel: 0,
            self_address: DEFAULT_SELF_ADDRESS,
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl DataSource {
    pub fn serial(path: &str) -> Self {
        DataSource::Serial {
            path: path.to_string(),
        }
    }

    pub fn tcp(address: &str) -> Self {
        DataSource::Tcp {
            address: address.to_string(),
            via_tag: None,
            password: None,
        }
    }

    /// Builder preconfigured for this source
    pub fn connection_builder(&self, options: &LiveOptions) -> ConnectionBuilder {
        let builder = match self {
            DataSource::Serial { path } => ConnectionBuilder::new().serial(path),
            DataSource::Tcp {
                address,
                via_tag,
                password,
            } => {
                let mut builder = ConnectionBuilder::new().tcp(address);
                if let Some(via_tag) = via_tag {
                    builder = builder.via_tag(via_tag);
                }
                if let Some(password) = password {
                    builder = builder.password(password);
                }
                builder
            }
        };

        builder
            .channel(options.channel)
            .self_address(options.self_address)
            .reconnect_policy(options.reconnect_policy.clone())
    }

    /// Open a live connection to this source
    ///
    /// Resolves once the connection is established.
    pub async fn connect_live(&self, options: LiveOptions) -> VbusResult<Connection> {
        let connection = self.connection_builder(&options).build()?;
        connection.connect().await?;
        log::info!("Connected live to {:?}", self);
        Ok(connection)
    }
}
