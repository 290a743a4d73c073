use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedServer {
    pub server_name: String,
    pub instance_name: String,
    #[serde(rename = "IP")]
    pub ip: String,
    pub ports: ServerPorts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerPorts {
    pub game_port: u16,
    pub rcon_port: u16,
    pub tv_port: u16,
}
