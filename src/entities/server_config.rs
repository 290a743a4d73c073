use super::RawPayload;
use crate::{config::Environment, error::ConfigError};

pub const TOKEN_KEY: &str = "SRCDS_TOKEN";

/// Number of variables published to the game container.
pub const FIELD_COUNT: usize = 27;

macro_rules! server_configuration {
    ($( $(#[$meta:meta])* $field:ident: $key:literal = $default:literal ),+ $(,)?) => {
        /// Fully defaulted settings for one game server. Every field maps to
        /// exactly one environment variable of the `joedwards32/cs2` image.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct ServerConfiguration {
            /// Game server login token from https://steamcommunity.com/dev/managegameservers
            pub srcds_token: String,
            $( $(#[$meta])* pub $field: String, )+
        }

        impl ServerConfiguration {
            /// Published variable names, in projection order.
            #[cfg(test)]
            pub const KEYS: [&'static str; FIELD_COUNT] = [TOKEN_KEY, $($key),+];

            fn with_defaults(payload: &RawPayload, srcds_token: String) -> Self {
                Self {
                    srcds_token,
                    $( $field: payload.get($key).unwrap_or($default).to_string(), )+
                }
            }

            /// Projects every field onto its variable name, in `KEYS` order.
            pub fn to_environment(&self) -> [(&'static str, String); FIELD_COUNT] {
                [
                    (TOKEN_KEY, self.srcds_token.clone()),
                    $( ($key, self.$field.clone()), )+
                ]
            }
        }
    };
}

server_configuration! {
    /// Visible name of the server
    server_name: "CS2_SERVERNAME" = "CS2_Game_Server",
    /// Join password
    password: "CS2_PW" = "",
    /// 0 disables cheats, 1 enables them
    cheats: "CS2_CHEATS" = "0",
    /// Game listen port, UDP
    port: "CS2_PORT" = "27015",
    /// RCON port, TCP
    rcon_port: "CS2_RCON_PORT" = "27050",
    max_players: "CS2_MAXPLAYERS" = "10",
    /// Extra arguments appended to the cs2 command line
    additional_args: "CS2_ADDITIONAL_ARGS" = "",
    /// casual, competitive, deathmatch... Empty means game type and mode apply
    game_alias: "CS2_GAMEALIAS" = "",
    game_type: "CS2_GAMETYPE" = "0",
    game_mode: "CS2_GAMEMODE" = "1",
    map_group: "CS2_MAPGROUP" = "mg_active",
    start_map: "CS2_STARTMAP" = "de_inferno",
    /// 0 easy, 1 normal, 2 hard, 3 expert. Empty keeps the image default
    bot_difficulty: "CS2_BOT_DIFFICULTY" = "",
    bot_quota: "CS2_BOT_QUOTA" = "",
    /// fill or competitive
    bot_quota_mode: "CS2_BOT_QUOTA_MODE" = "",
    tv_autorecord: "TV_AUTORECORD" = "0",
    tv_enable: "TV_ENABLE" = "0",
    /// CSTV broadcast port, UDP
    tv_port: "TV_PORT" = "27020",
    tv_password: "TV_PW" = "changeme",
    tv_relay_password: "TV_RELAY_PW" = "changeme",
    tv_max_rate: "TV_MAXRATE" = "0",
    tv_delay: "TV_DELAY" = "0",
    /// on or off
    log: "CS2_LOG" = "on",
    log_money: "CS2_LOG_MONEY" = "0",
    /// 0 disabled, 1 enemy, 2 friendly, 3 all
    log_detail: "CS2_LOG_DETAIL" = "0",
    log_items: "CS2_LOG_ITEMS" = "0",
}

impl ServerConfiguration {
    /// Builds the configuration from a request payload. The token falls back
    /// to the process environment; every other field falls back to its
    /// default.
    pub fn resolve(payload: &RawPayload, env: &dyn Environment) -> Result<Self, ConfigError> {
        let srcds_token = payload
            .get(TOKEN_KEY)
            .map(str::to_string)
            .or_else(|| env.var(TOKEN_KEY))
            .ok_or(ConfigError::MissingRequiredField(TOKEN_KEY))?;

        Ok(Self::with_defaults(payload, srcds_token))
    }

    /// Rebuilds a configuration from a projection produced by `to_environment`.
    #[cfg(test)]
    pub fn from_environment<'a, I>(variables: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let payload: RawPayload = variables.into_iter().collect();
        Self::resolve(&payload, &crate::config::StaticEnvironment::default())
    }

    pub fn game_port(&self) -> Result<u16, ConfigError> {
        parse_port("CS2_PORT", &self.port)
    }

    pub fn rcon_port(&self) -> Result<u16, ConfigError> {
        parse_port("CS2_RCON_PORT", &self.rcon_port)
    }

    pub fn tv_port(&self) -> Result<u16, ConfigError> {
        parse_port("TV_PORT", &self.tv_port)
    }
}

fn parse_port(key: &'static str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidSetting {
            key,
            expected: "a port number",
            value: value.to_string(),
        })
}
