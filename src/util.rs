use std::net::{IpAddr, Ipv4Addr};

const PORT: &str = "PORT";

const DEFAULT_PORT: u16 = 8080;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const BIND_ADDR: &str = "BIND_ADDR";

const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

pub fn get_addr() -> IpAddr {
    let addr_from_env = std::env::var(BIND_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| res.parse().unwrap_or(DEFAULT_ADDR))
}

const ICMP_TARGETS: &str = "ICMP_TARGETS";

pub fn get_icmp_targets() -> Option<String> {
    non_empty_var(ICMP_TARGETS)
}

const TCP_TARGETS: &str = "TCP_TARGETS";

pub fn get_tcp_targets() -> Option<String> {
    non_empty_var(TCP_TARGETS)
}

const RUN_DURATION: &str = "RUN_DURATION";

pub fn get_run_duration() -> Option<String> {
    non_empty_var(RUN_DURATION)
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
