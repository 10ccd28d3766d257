//! The status record reported by the box.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::decode::{self, DecodeError, FieldRef};

/// Declares [BoxInfo] from a table of `field: type = "wireKey" => validator`.
///
/// Fields are decoded in table order and the first failure is returned.
macro_rules! box_info {
    ($(
        $(#[$meta:meta])*
        $field:ident: $ty:ty = $key:literal => $decode:path,
    )*) => {
        /// A snapshot of the box and the printer behind it, as returned by
        /// the status query.
        ///
        /// Every field is required: a record is either fully decoded or not
        /// built at all.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
        pub struct BoxInfo {
            $(
                $(#[$meta])*
                pub $field: $ty,
            )*
        }

        impl BoxInfo {
            /// Every field of the record paired with its key on the wire.
            pub const FIELDS: &'static [(&'static str, &'static str)] = &[
                $((stringify!($field), $key),)*
            ];

            /// Decode a status document that has already been parsed into a
            /// JSON object.
            pub fn from_map(obj: &Map<String, Value>) -> Result<Self, DecodeError> {
                Ok(Self {
                    $(
                        $field: $decode(
                            FieldRef {
                                field: stringify!($field),
                                key: $key,
                            },
                            obj.get($key),
                        )?,
                    )*
                })
            }
        }
    };
}

box_info! {
    /// Command group echoed back by the box (`main`).
    opt: String = "opt" => decode::string,
    /// Command name echoed back by the box (`Info`).
    fname: String = "fname" => decode::string,
    /// Command function echoed back by the box (`get`).
    function: String = "function" => decode::string,

    // Network.
    /// WAN addressing mode, e.g. `dhcp`.
    wanmode: String = "wanmode" => decode::string,
    /// Physical WAN link state.
    wanphy_link: i64 = "wanphy_link" => decode::integer,
    /// Link status.
    link_status: i64 = "link_status" => decode::integer,
    /// WAN IP address.
    wanip: String = "wanip" => decode::string,
    /// SSID of the box's own access point.
    ssid: String = "ssid" => decode::string,
    /// WiFi channel.
    channel: i64 = "channel" => decode::integer,
    /// WiFi security mode.
    security: i64 = "security" => decode::integer,
    /// WiFi password.
    wifipasswd: String = "wifipasswd" => decode::string,
    /// SSID the box is connected to as a client.
    apclissid: String = "apclissid" => decode::string,
    /// MAC address used in client mode.
    apclimac: String = "apclimac" => decode::string,
    /// Cloud service the box is bound to.
    iot_type: String = "iot_type" => decode::string,
    /// Cloud connection state.
    connect: i64 = "connect" => decode::integer,

    // Identity and control.
    /// Printer model, e.g. `Ender-3`.
    model: String = "model" => decode::string,
    /// Fan state.
    fan: i64 = "fan" => decode::integer,

    // Temperatures, in whole degrees Celsius.
    /// Nozzle temperature.
    nozzle_temp: i64 = "nozzleTemp" => decode::integer,
    /// Bed temperature.
    bed_temp: i64 = "bedTemp" => decode::integer,
    /// First nozzle temperature.
    the_1_st_nozzle_temp: i64 = "_1st_nozzleTemp" => decode::integer,
    /// Second nozzle temperature.
    the_2_nd_nozzle_temp: i64 = "_2nd_nozzleTemp" => decode::integer,
    /// Chamber temperature.
    chamber_temp: i64 = "chamberTemp" => decode::integer,
    /// Nozzle temperature, second set.
    nozzle_temp2: i64 = "nozzleTemp2" => decode::integer,
    /// Bed temperature, second set.
    bed_temp2: i64 = "bedTemp2" => decode::integer,
    /// First nozzle temperature, second set.
    the_1_st_nozzle_temp2: i64 = "_1st_nozzleTemp2" => decode::integer,
    /// Second nozzle temperature, second set.
    the_2_nd_nozzle_temp2: i64 = "_2nd_nozzleTemp2" => decode::integer,
    /// Chamber temperature, second set.
    chamber_temp2: i64 = "chamberTemp2" => decode::integer,

    // Print job.
    /// Name of the current print, or the idle banner.
    print_name: String = "print" => decode::string,
    /// Print progress in percent.
    print_progress: i64 = "printProgress" => decode::integer,
    /// Stop flag.
    stop: i64 = "stop" => decode::integer,
    /// Unix time the print started at.
    print_start_time: i64 = "printStartTime" => decode::timestamp_string,
    /// Printer state.
    state: i64 = "state" => decode::integer,
    /// Printer error code.
    err: i64 = "err" => decode::integer,
    /// Firmware version of the box.
    box_version: String = "boxVersion" => decode::string,
    /// Available upgrade.
    upgrade: String = "upgrade" => decode::string,
    /// Upgrade status.
    upgrade_status: i64 = "upgradeStatus" => decode::integer,
    /// Whether an SD card is inserted.
    tf_card: i64 = "tfCard" => decode::integer,
    /// Download progress in percent.
    d_progress: i64 = "dProgress" => decode::integer,
    /// Current layer.
    layer: i64 = "layer" => decode::integer,
    /// Pause flag.
    pause: i64 = "pause" => decode::integer,
    /// Reboot flag.
    reboot: i64 = "reboot" => decode::integer,
    /// Video flag.
    video: i64 = "video" => decode::integer,
    /// Device id string.
    did_string: String = "DIDString" => decode::string,
    /// API license.
    api_license: String = "APILicense" => decode::string,
    /// Init string.
    init_string: String = "InitString" => decode::string,
    /// Number of times the current job has been printed.
    printed_times: i64 = "printedTimes" => decode::integer,
    /// Number of times the current job is left to print.
    times_left_to_print: i64 = "timesLeftToPrint" => decode::integer,
    /// Cloud owner id.
    owner_id: String = "ownerId" => decode::string,
    /// Feed rate in percent.
    cur_feedrate_pct: i64 = "curFeedratePct" => decode::integer,
    /// Toolhead position, e.g. `X10 Y20 Z30`.
    cur_position: String = "curPosition" => decode::string,
    /// Autohome flag.
    autohome: i64 = "autohome" => decode::integer,
    /// Power loss recovery status.
    repo_plr_status: i64 = "repoPlrStatus" => decode::integer,
    /// Model firmware version.
    model_version: String = "modelVersion" => decode::string,
    /// Whether the printer MCU is printing.
    mcu_is_print: i64 = "mcu_is_print" => decode::integer,
    /// Estimated seconds left.
    print_left_time: i64 = "printLeftTime" => decode::integer,
    /// Seconds spent printing.
    print_job_time: i64 = "printJobTime" => decode::integer,
    /// LAN IP address.
    net_ip: String = "netIP" => decode::string,
    /// Loaded filament type.
    filament_type: String = "FilamentType" => decode::string,
    /// Filament consumed. The firmware sends an empty string for zero.
    consumables_len: i64 = "ConsumablesLen" => decode::integer_string,
    /// Total layers of the current print.
    total_layer: i64 = "TotalLayer" => decode::integer,
    /// LED state.
    led_state: i64 = "led_state" => decode::integer,
    /// Whether the box reported an error.
    error: bool = "error" => decode::flag,
}

impl BoxInfo {
    /// Decode a parsed status document.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(obj) => Self::from_map(obj),
            other => Err(DecodeError::NotAnObject {
                found: decode::kind_of(Some(other)),
            }),
        }
    }
}

impl TryFrom<&Value> for BoxInfo {
    type Error = DecodeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl<'de> Deserialize<'de> for BoxInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
