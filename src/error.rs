use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum FetchError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("ticker symbol must not be empty")]
    EmptySymbol,
    #[display("could not fetch data for {symbol}")]
    Fetch { symbol: String },
    #[display("no data found for symbol: {symbol}")]
    NoData { symbol: String },
}

#[derive(Debug, Display, Error)]
pub enum RenderError {
    #[display("failed to write output")]
    Write,
    #[display("failed to encode output")]
    Encode,
}

#[derive(Debug, Display, Error)]
pub enum SessionError {
    #[display("failed to read input")]
    Input,
}
