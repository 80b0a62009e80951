pub(crate) const QUADCONS_ASSERT_LEVEL_DEFINITION: u8 = if cfg!(feature = "debug-checks") {
    QUADCONS_ASSERT_ADVANCED
} else {
    QUADCONS_ASSERT_SIMPLE
};

pub(crate) const QUADCONS_ASSERT_SIMPLE: u8 = 1;
pub(crate) const QUADCONS_ASSERT_MODERATE: u8 = 2;
pub(crate) const QUADCONS_ASSERT_ADVANCED: u8 = 3;

#[macro_export]
#[doc(hidden)]
macro_rules! print_quadcons_assert_warning_message {
    () => {
        if $crate::quadcons_asserts::QUADCONS_ASSERT_LEVEL_DEFINITION
            >= $crate::quadcons_asserts::QUADCONS_ASSERT_MODERATE
        {
            log::warn!("Potential performance degradation: the quadcons assert level is set to {}, meaning many debug asserts are active which may result in performance degradation.", $crate::quadcons_asserts::QUADCONS_ASSERT_LEVEL_DEFINITION);
        };
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! quadcons_assert_simple {
    ($($arg:tt)*) => {
        if $crate::quadcons_asserts::QUADCONS_ASSERT_LEVEL_DEFINITION
            >= $crate::quadcons_asserts::QUADCONS_ASSERT_SIMPLE
        {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! quadcons_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::quadcons_asserts::QUADCONS_ASSERT_LEVEL_DEFINITION
            >= $crate::quadcons_asserts::QUADCONS_ASSERT_SIMPLE
        {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! quadcons_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::quadcons_asserts::QUADCONS_ASSERT_LEVEL_DEFINITION
            >= $crate::quadcons_asserts::QUADCONS_ASSERT_MODERATE
        {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! quadcons_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::quadcons_asserts::QUADCONS_ASSERT_LEVEL_DEFINITION
            >= $crate::quadcons_asserts::QUADCONS_ASSERT_ADVANCED
        {
            assert!($($arg)*);
        }
    };
}
