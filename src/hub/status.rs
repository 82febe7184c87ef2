use core::fmt;

/// HTTP-style status code carried in response topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status(pub u16);

impl Status {
    /// 200
    pub const OK: Status = Status(200);
    /// 202
    pub const ACCEPTED: Status = Status(202);
    /// 204, the response to a reported-properties PATCH.
    pub const NO_CONTENT: Status = Status(204);
    /// 400
    pub const BAD_REQUEST: Status = Status(400);
    /// 401
    pub const UNAUTHORIZED: Status = Status(401);
    /// 403
    pub const FORBIDDEN: Status = Status(403);
    /// 404
    pub const NOT_FOUND: Status = Status(404);
    /// 405
    pub const NOT_ALLOWED: Status = Status(405);
    /// 409
    pub const NOT_CONFLICT: Status = Status(409);
    /// 412
    pub const PRECONDITION_FAILED: Status = Status(412);
    /// 413
    pub const REQUEST_TOO_LARGE: Status = Status(413);
    /// 415
    pub const UNSUPPORTED_TYPE: Status = Status(415);
    /// 429
    pub const THROTTLED: Status = Status(429);
    /// 499
    pub const CLIENT_CLOSED: Status = Status(499);
    /// 500
    pub const SERVER_ERROR: Status = Status(500);
    /// 502
    pub const BAD_GATEWAY: Status = Status(502);
    /// 503
    pub const SERVICE_UNAVAILABLE: Status = Status(503);
    /// 504
    pub const TIMEOUT: Status = Status(504);

    /// Whether this is a 2xx code.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Whether a request that got this status may be retried later.
    pub fn is_retriable(self) -> bool {
        self == Status::THROTTLED || self.0 >= 500
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(Status::OK.is_success());
        assert!(Status::NO_CONTENT.is_success());
        assert!(!Status::BAD_REQUEST.is_success());
        assert!(!Status(300).is_success());
    }

    #[test]
    fn test_retriable() {
        assert!(Status::THROTTLED.is_retriable());
        assert!(Status::SERVICE_UNAVAILABLE.is_retriable());
        assert!(!Status::NOT_FOUND.is_retriable());
    }
}
