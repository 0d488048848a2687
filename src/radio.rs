//! Narrow interface to the cellular-modem control collaborator.
//!
//! The control layer never talks to a modem directly; tasks consume this
//! trait. Real implementations wrap the vendor's modem API; tests provide
//! fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::TaskError;

/// One refresh of the modem's radio parameters.
///
/// Serializes with the uppercase field names the result payload format uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RadioParams {
    /// Reference signal received power, dBm.
    #[serde(rename = "RSRP")]
    pub rsrp_dbm: i32,
    /// Reference signal received quality, dB.
    #[serde(rename = "RSRQ")]
    pub rsrq_db: i32,
    /// Received signal strength indication, dBm.
    #[serde(rename = "RSSI")]
    pub rssi_dbm: i32,
    /// GSM-style receive quality index.
    #[serde(rename = "RxQual")]
    pub rx_qual: i32,
    /// Serving cell identifier.
    #[serde(rename = "CellID")]
    pub cell_id: i32,
    /// E-UTRA absolute radio-frequency channel number.
    #[serde(rename = "EARFCN")]
    pub earfcn: i32,
}

/// One operator found by a network scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Operator name as reported by the modem.
    pub operator_name: String,
    /// Mobile country code / mobile network code pair.
    pub mcc_mnc: String,
}

/// Modem operations the built-in tasks need.
#[async_trait]
pub trait Radio: Send + Sync + 'static {
    /// Refreshes and returns the current radio parameters.
    async fn refresh_radio_params(&self) -> Result<RadioParams, TaskError>;

    /// Scans for network operators, yielding each as the modem reports it.
    ///
    /// A scan can take minutes; dropping the stream aborts it. Consumers
    /// check their stop token between items to keep cancellation prompt.
    fn scan_networks(&self) -> BoxStream<'_, Result<NetworkInfo, TaskError>>;
}
