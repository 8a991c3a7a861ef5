use std::net::IpAddr;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Exports PDU status readings as Prometheus metrics")]
pub struct Args {
    #[arg(long, env = "PDU_ADDRESS")]
    pub pdu_address: String,

    #[arg(long, env = "PDU_PORT", default_value_t = 80)]
    pub pdu_port: u16,

    /// Seconds slept between the end of one poll and the start of the next.
    #[arg(long, env = "POLLING_INTERVAL_SECONDS", default_value_t = 5)]
    pub polling_interval_seconds: u64,

    #[arg(long, env = "LISTEN_ADDRESS", default_value = "0.0.0.0")]
    pub listen_address: IpAddr,

    #[arg(long, env = "LISTEN_PORT", default_value_t = 9100)]
    pub listen_port: u16,

    /// Seconds before a request to the PDU is abandoned.
    #[arg(long, env = "PDU_REQUEST_TIMEOUT", default_value_t = 5)]
    pub pdu_request_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["pdu-exporter", "--pdu-address", "10.0.0.8"]).unwrap();
        assert_eq!(args.pdu_address, "10.0.0.8");
        assert_eq!(args.pdu_port, 80);
        assert_eq!(args.polling_interval_seconds, 5);
        assert_eq!(args.listen_port, 9100);
        assert_eq!(args.pdu_request_timeout, 5);
    }
}
