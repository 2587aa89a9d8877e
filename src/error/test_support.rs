use super::{DataError, MonitorError, SinkError, ValidationError};

impl From<&'static str> for ValidationError {
    fn from(message: &'static str) -> Self {
        ValidationError::TestExpectation { message }
    }
}

impl From<String> for ValidationError {
    fn from(value: String) -> Self {
        ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for DataError {
    fn from(message: &'static str) -> Self {
        DataError::TestExpectation { message }
    }
}

impl From<String> for DataError {
    fn from(value: String) -> Self {
        DataError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for MonitorError {
    fn from(message: &'static str) -> Self {
        MonitorError::TestExpectation { message }
    }
}

impl From<String> for MonitorError {
    fn from(value: String) -> Self {
        MonitorError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for SinkError {
    fn from(message: &'static str) -> Self {
        SinkError::TestExpectation { message }
    }
}

impl From<String> for SinkError {
    fn from(value: String) -> Self {
        SinkError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
