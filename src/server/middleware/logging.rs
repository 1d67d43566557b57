//! HTTP request logging middleware

/// Log every artifact request with status, timing and peer
pub fn with_request_logging() -> warp::filters::log::Log<impl Fn(warp::filters::log::Info) + Clone>
{
    warp::log::custom(|info| {
        let status = info.status();
        let elapsed_ms = info.elapsed().as_millis();
        let remote_addr = info
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if status.is_client_error() || status.is_server_error() {
            log::warn!(
                "{} {} - {} {}ms - {} - User-Agent: \"{}\"",
                info.method(),
                info.path(),
                status,
                elapsed_ms,
                remote_addr,
                info.user_agent().unwrap_or("unknown")
            );
        } else {
            log::info!(
                "{} {} - {} {}ms - {}",
                info.method(),
                info.path(),
                status,
                elapsed_ms,
                remote_addr
            );
        }
    })
}
