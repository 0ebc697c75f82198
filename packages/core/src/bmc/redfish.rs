//! Redfish client
//!
//! Resource ids default to Dell iDRAC naming. BMCs ship self-signed
//! certificates, so certificate validation is off.

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::controller::BmcClient;
use super::descriptor::BmcDescriptor;
use super::error::BmcError;

/// Redfish resource ids for the system, its manager and the virtual CD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedfishPaths {
    pub system_id: String,
    pub manager_id: String,
    pub media_id: String,
}

impl Default for RedfishPaths {
    fn default() -> Self {
        Self {
            system_id: "System.Embedded.1".to_string(),
            manager_id: "iDRAC.Embedded.1".to_string(),
            media_id: "CD".to_string(),
        }
    }
}

impl RedfishPaths {
    pub fn system(&self) -> String {
        format!("/redfish/v1/Systems/{}", self.system_id)
    }

    pub fn virtual_media(&self) -> String {
        format!(
            "/redfish/v1/Managers/{}/VirtualMedia/{}",
            self.manager_id, self.media_id
        )
    }

    pub fn eject_action(&self) -> String {
        format!("{}/Actions/VirtualMedia.EjectMedia", self.virtual_media())
    }

    pub fn insert_action(&self) -> String {
        format!("{}/Actions/VirtualMedia.InsertMedia", self.virtual_media())
    }

    pub fn reset_action(&self) -> String {
        format!("{}/Actions/ComputerSystem.Reset", self.system())
    }
}

/// `ResetType` values of `ComputerSystem.Reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    ForceRestart,
    ForceOff,
    On,
}

impl ResetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetType::ForceRestart => "ForceRestart",
            ResetType::ForceOff => "ForceOff",
            ResetType::On => "On",
        }
    }
}

pub fn insert_media_body(image: &str) -> Value {
    json!({
        "Image": image,
        "Inserted": true,
        "WriteProtected": true,
    })
}

/// Boot from the virtual CD on the next boot only
pub fn boot_once_body() -> Value {
    json!({
        "Boot": {
            "BootSourceOverrideTarget": "Cd",
            "BootSourceOverrideEnabled": "Once",
        }
    })
}

pub fn reset_body(reset: ResetType) -> Value {
    json!({ "ResetType": reset.as_str() })
}

/// Blocking Redfish client for one BMC
pub struct RedfishClient {
    descriptor: BmcDescriptor,
    paths: RedfishPaths,
    client: Client,
}

impl RedfishClient {
    pub fn new(
        descriptor: BmcDescriptor,
        paths: RedfishPaths,
        timeout: Duration,
    ) -> Result<Self, BmcError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            descriptor,
            paths,
            client,
        })
    }

    pub fn descriptor(&self) -> &BmcDescriptor {
        &self.descriptor
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.descriptor.address, path)
    }

    fn send(&self, method: Method, path: &str, body: &Value) -> Result<(), BmcError> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .basic_auth(&self.descriptor.username, Some(&self.descriptor.password))
            .json(body)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(BmcError::Http {
            address: self.descriptor.address.clone(),
            status: status.as_u16(),
            body,
        })
    }

    fn reset(&self, reset: ResetType) -> Result<(), BmcError> {
        self.send(Method::POST, &self.paths.reset_action(), &reset_body(reset))
    }
}

impl BmcClient for RedfishClient {
    fn address(&self) -> &str {
        &self.descriptor.address
    }

    fn eject_media(&self) -> Result<(), BmcError> {
        self.send(Method::POST, &self.paths.eject_action(), &json!({}))
    }

    fn insert_media(&self, image: &str) -> Result<(), BmcError> {
        self.send(
            Method::POST,
            &self.paths.insert_action(),
            &insert_media_body(image),
        )
    }

    fn set_boot_once(&self) -> Result<(), BmcError> {
        self.send(Method::PATCH, &self.paths.system(), &boot_once_body())
    }

    fn restart(&self) -> Result<(), BmcError> {
        self.reset(ResetType::ForceRestart)
    }

    fn power_off(&self) -> Result<(), BmcError> {
        self.reset(ResetType::ForceOff)
    }

    fn power_on(&self) -> Result<(), BmcError> {
        self.reset(ResetType::On)
    }
}
