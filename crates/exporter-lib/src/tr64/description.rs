//! Device description (`tr64desc.xml`) and SCPD parsing

use crate::catalog::{ActionDescriptor, Parameter, ServiceType};
use crate::error::TransportError;
use serde::Deserialize;
use std::collections::HashMap;

/// A service advertised in the device description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service_type: ServiceType,
    /// Path relative to the device base URL
    pub control_url: String,
    pub scpd_url: String,
}

#[derive(Deserialize)]
struct Root {
    device: DeviceNode,
}

#[derive(Deserialize)]
struct DeviceNode {
    #[serde(rename = "serviceList", default)]
    service_list: Option<ServiceList>,
    #[serde(rename = "deviceList", default)]
    device_list: Option<DeviceList>,
}

#[derive(Deserialize)]
struct ServiceList {
    #[serde(default)]
    service: Vec<ServiceNode>,
}

#[derive(Deserialize)]
struct DeviceList {
    #[serde(default)]
    device: Vec<DeviceNode>,
}

#[derive(Deserialize)]
struct ServiceNode {
    #[serde(rename = "serviceType")]
    service_type: String,
    #[serde(rename = "controlURL")]
    control_url: String,
    #[serde(rename = "SCPDURL")]
    scpd_url: String,
}

#[derive(Deserialize)]
struct Scpd {
    #[serde(rename = "actionList", default)]
    action_list: Option<ActionList>,
    #[serde(rename = "serviceStateTable", default)]
    service_state_table: Option<ServiceStateTable>,
}

#[derive(Deserialize)]
struct ActionList {
    #[serde(default)]
    action: Vec<ActionNode>,
}

#[derive(Deserialize)]
struct ActionNode {
    name: String,
    #[serde(rename = "argumentList", default)]
    argument_list: Option<ArgumentList>,
}

#[derive(Deserialize)]
struct ArgumentList {
    #[serde(default)]
    argument: Vec<ArgumentNode>,
}

#[derive(Deserialize)]
struct ArgumentNode {
    name: String,
    direction: String,
    #[serde(rename = "relatedStateVariable")]
    related_state_variable: String,
}

#[derive(Deserialize)]
struct ServiceStateTable {
    #[serde(rename = "stateVariable", default)]
    state_variable: Vec<StateVariable>,
}

#[derive(Deserialize)]
struct StateVariable {
    name: String,
    #[serde(rename = "dataType")]
    data_type: String,
}

/// Every service of the root device and its embedded devices
pub fn parse_description(xml: &str) -> Result<Vec<ServiceEntry>, TransportError> {
    let root: Root = quick_xml::de::from_str(xml)?;
    let mut services = Vec::new();
    collect_services(&root.device, &mut services);
    Ok(services)
}

fn collect_services(device: &DeviceNode, out: &mut Vec<ServiceEntry>) {
    if let Some(list) = &device.service_list {
        out.extend(list.service.iter().map(|node| ServiceEntry {
            service_type: ServiceType::new(node.service_type.trim()),
            control_url: node.control_url.trim().to_string(),
            scpd_url: node.scpd_url.trim().to_string(),
        }));
    }
    if let Some(list) = &device.device_list {
        for child in &list.device {
            collect_services(child, out);
        }
    }
}

/// Actions of one service, with argument types taken from the state table
pub fn parse_scpd(xml: &str) -> Result<Vec<ActionDescriptor>, TransportError> {
    let scpd: Scpd = quick_xml::de::from_str(xml)?;

    let types: HashMap<&str, &str> = scpd
        .service_state_table
        .iter()
        .flat_map(|table| &table.state_variable)
        .map(|var| (var.name.as_str(), var.data_type.trim()))
        .collect();

    let actions = scpd
        .action_list
        .iter()
        .flat_map(|list| &list.action)
        .map(|node| {
            let mut action = ActionDescriptor::new(node.name.trim());
            for arg in node.argument_list.iter().flat_map(|list| &list.argument) {
                let data_type = types
                    .get(arg.related_state_variable.trim())
                    .copied()
                    .unwrap_or("unknown");
                let param = Parameter::new(arg.name.trim(), data_type);
                if arg.direction.trim().eq_ignore_ascii_case("in") {
                    action.inputs.push(param);
                } else {
                    action.outputs.push(param);
                }
            }
            action
        })
        .collect();

    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:dslforum-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:dslforum-org:device:InternetGatewayDevice:1</deviceType>
    <friendlyName>FRITZ!Box 7590</friendlyName>
    <serviceList>
      <service>
        <serviceType>urn:dslforum-org:service:DeviceInfo:1</serviceType>
        <serviceId>urn:DeviceInfo-com:serviceId:DeviceInfo1</serviceId>
        <controlURL>/upnp/control/deviceinfo</controlURL>
        <eventSubURL>/upnp/control/deviceinfo</eventSubURL>
        <SCPDURL>/deviceinfoSCPD.xml</SCPDURL>
      </service>
    </serviceList>
    <deviceList>
      <device>
        <deviceType>urn:dslforum-org:device:WANDevice:1</deviceType>
        <serviceList>
          <service>
            <serviceType>urn:dslforum-org:service:WANCommonInterfaceConfig:1</serviceType>
            <serviceId>urn:WANCIfConfig-com:serviceId:WANCommonInterfaceConfig1</serviceId>
            <controlURL>/upnp/control/wancommonifconfig1</controlURL>
            <eventSubURL>/upnp/control/wancommonifconfig1</eventSubURL>
            <SCPDURL>/wancommonifconfigSCPD.xml</SCPDURL>
          </service>
        </serviceList>
      </device>
    </deviceList>
  </device>
</root>"#;

    const SCPD: &str = r#"<?xml version="1.0"?>
<scpd xmlns="urn:dslforum-org:service-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <actionList>
    <action>
      <name>GetInfo</name>
      <argumentList>
        <argument>
          <name>NewUpTime</name>
          <direction>out</direction>
          <relatedStateVariable>UpTime</relatedStateVariable>
        </argument>
        <argument>
          <name>NewDescription</name>
          <direction>out</direction>
          <relatedStateVariable>Description</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
    <action>
      <name>SetProvisioningCode</name>
      <argumentList>
        <argument>
          <name>NewProvisioningCode</name>
          <direction>in</direction>
          <relatedStateVariable>ProvisioningCode</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
    <action>
      <name>Reboot</name>
    </action>
  </actionList>
  <serviceStateTable>
    <stateVariable sendEvents="no">
      <name>UpTime</name>
      <dataType>ui4</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>Description</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>ProvisioningCode</name>
      <dataType>string</dataType>
    </stateVariable>
  </serviceStateTable>
</scpd>"#;

    #[test]
    fn test_parse_description_walks_nested_devices() {
        let services = parse_description(DESCRIPTION).unwrap();
        assert_eq!(services.len(), 2);

        assert_eq!(
            services[0],
            ServiceEntry {
                service_type: ServiceType::new("urn:dslforum-org:service:DeviceInfo:1"),
                control_url: "/upnp/control/deviceinfo".to_string(),
                scpd_url: "/deviceinfoSCPD.xml".to_string(),
            }
        );
        assert_eq!(
            services[1].service_type.short_name(),
            "WANCommonInterfaceConfig"
        );
        assert_eq!(services[1].control_url, "/upnp/control/wancommonifconfig1");
    }

    #[test]
    fn test_parse_scpd_splits_directions_and_types() {
        let actions = parse_scpd(SCPD).unwrap();
        assert_eq!(actions.len(), 3);

        let info = &actions[0];
        assert_eq!(info.name, "GetInfo");
        assert!(info.inputs.is_empty());
        assert_eq!(
            info.outputs,
            vec![
                Parameter::new("NewUpTime", "ui4"),
                Parameter::new("NewDescription", "string"),
            ]
        );

        let set = &actions[1];
        assert_eq!(set.inputs, vec![Parameter::new("NewProvisioningCode", "string")]);
        assert!(set.outputs.is_empty());

        let reboot = &actions[2];
        assert!(reboot.inputs.is_empty() && reboot.outputs.is_empty());
    }

    #[test]
    fn test_parse_scpd_unknown_state_variable() {
        let xml = r#"<scpd><actionList><action><name>GetX</name><argumentList>
            <argument><name>NewX</name><direction>out</direction><relatedStateVariable>Missing</relatedStateVariable></argument>
            </argumentList></action></actionList></scpd>"#;
        let actions = parse_scpd(xml).unwrap();
        assert_eq!(actions[0].outputs, vec![Parameter::new("NewX", "unknown")]);
    }

    #[test]
    fn test_parse_description_rejects_garbage() {
        assert!(parse_description("<html><body>login</body></html>").is_err());
    }
}
