use super::*;

pub trait TimeExt {
    fn now() -> metav1::Time;
    fn ago(elapsed: jiff::SignedDuration) -> metav1::Time;
}

impl TimeExt for metav1::Time {
    /// Create a metav1::Time set to the current UTC time.
    ///
    /// # Examples
    ///
    /// ```
    /// use stopws_ext::{metav1, TimeExt as _};
    /// let now = metav1::Time::now();
    /// ```
    fn now() -> metav1::Time {
        Self(Timestamp::now())
    }

    /// Create a metav1::Time `elapsed` before now.
    ///
    /// # Examples
    ///
    /// ```
    /// use stopws_ext::{jiff, metav1, TimeExt as _};
    /// let two_hours_ago = metav1::Time::ago(jiff::SignedDuration::from_hours(2));
    /// assert!(two_hours_ago.0 < metav1::Time::now().0);
    /// ```
    fn ago(elapsed: jiff::SignedDuration) -> metav1::Time {
        Self(Timestamp::now() - elapsed)
    }
}
