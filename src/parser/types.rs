/// Where the satellite was seen from, as far as the message tells us.
#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
    /// Quoted query text, a possessive username, or a place name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMention {
    pub satellite: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// The message carried an explicit `#time` tag.
    pub explicit_time: bool,
    pub observer: Option<Observer>,
}
