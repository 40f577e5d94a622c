//! Redis error mapping to BrokerError.

use chatrelay_core::broker::BrokerError;

/// Maps Redis errors to BrokerError.
///
/// Transport problems become `ConnectionFailed`; anything else is reported
/// through `other`, which names the operation that failed.
pub(crate) fn map_redis_error(
    err: redis::RedisError,
    other: fn(String) -> BrokerError,
) -> BrokerError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        BrokerError::ConnectionFailed(err.to_string())
    } else {
        other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_connection_failures() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = map_redis_error(redis::RedisError::from(io), BrokerError::PublishFailed);
        assert!(matches!(err, BrokerError::ConnectionFailed(_)));
    }

    #[test]
    fn test_other_errors_use_operation_variant() {
        let err = redis::RedisError::from((redis::ErrorKind::TypeError, "bad type"));
        let mapped = map_redis_error(err, BrokerError::PublishFailed);
        assert!(matches!(mapped, BrokerError::PublishFailed(_)));
    }
}
