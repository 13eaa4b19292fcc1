//! Month-over-month dashboard figures.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use super::Order;

/// Half-open time range `[start, end)`; an open end reaches the present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound, if any.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Whether `instant` falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.end.is_none_or(|end| instant < end)
    }
}

/// The current and previous month, for growth comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindows {
    /// Period being reported.
    pub current: TimeWindow,
    /// Period it is compared with.
    pub previous: TimeWindow,
}

impl MonthWindows {
    /// `[now − 1 month, …)` against `[now − 2 months, now − 1 month)`.
    pub fn trailing(now: DateTime<Utc>) -> Self {
        let month_ago = months_before(now, 1);
        let two_months_ago = months_before(now, 2);
        Self {
            current: TimeWindow {
                start: month_ago,
                end: None,
            },
            previous: TimeWindow {
                start: two_months_ago,
                end: Some(month_ago),
            },
        }
    }

    /// Calendar month of `now` (UTC) against the month before it.
    pub fn calendar(now: DateTime<Utc>) -> Self {
        let start_of_month = first_of_month(now);
        let start_of_previous = months_before(start_of_month, 1);
        Self {
            current: TimeWindow {
                start: start_of_month,
                end: None,
            },
            previous: TimeWindow {
                start: start_of_previous,
                end: Some(start_of_month),
            },
        }
    }
}

fn months_before(instant: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    instant
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn first_of_month(instant: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(instant.year(), instant.month(), 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(instant, |naive| Utc.from_utc_datetime(&naive))
}

/// Percentage change from `previous` to `current`, rounded to two places.
///
/// A previous period with no activity reports 100 when the current one has
/// some, and 0 when both are empty.
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use storefront::domain::growth_percentage;
///
/// assert_eq!(growth_percentage(Decimal::from(3), Decimal::from(2)), Decimal::from(50));
/// assert_eq!(growth_percentage(Decimal::from(4), Decimal::ZERO), Decimal::from(100));
/// ```
pub fn growth_percentage(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
    } else if current > Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Aggregated order figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStats {
    /// Orders ever placed.
    pub total_orders: u64,
    /// Revenue across every order ever placed.
    pub total_revenue: Decimal,
    /// Orders in the current window.
    pub orders_this_month: u64,
    /// Revenue in the current window.
    pub revenue_this_month: Decimal,
    /// Growth in order count against the previous window.
    pub order_growth: Decimal,
    /// Growth in revenue against the previous window.
    pub revenue_growth: Decimal,
    /// Up to [`OrderStats::RECENT_LIMIT`] newest orders of the current window.
    pub recent_orders: Vec<Order>,
}

impl OrderStats {
    /// Number of orders listed in `recent_orders`.
    pub const RECENT_LIMIT: usize = 5;

    /// Reduce the current and previous window rows into dashboard figures.
    ///
    /// `current` must be ordered newest first.
    pub fn summarise(
        total_orders: u64,
        total_revenue: Decimal,
        current: Vec<Order>,
        previous: &[Order],
    ) -> Self {
        let orders_this_month = current.len() as u64;
        let orders_previous = previous.len() as u64;
        let revenue_this_month: Decimal = current.iter().map(Order::total).sum();
        let revenue_previous: Decimal = previous.iter().map(Order::total).sum();
        let mut recent_orders = current;
        recent_orders.truncate(Self::RECENT_LIMIT);
        Self {
            total_orders,
            total_revenue,
            orders_this_month,
            revenue_this_month,
            order_growth: growth_percentage(
                Decimal::from(orders_this_month),
                Decimal::from(orders_previous),
            ),
            revenue_growth: growth_percentage(revenue_this_month, revenue_previous),
            recent_orders,
        }
    }
}

/// Aggregated sign-up figures for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserStats {
    /// Accounts in the store.
    pub total_users: u64,
    /// Accounts created in the current calendar month.
    pub new_users_this_month: u64,
    /// Accounts created in the previous calendar month.
    pub new_users_last_month: u64,
    /// Growth against the previous calendar month.
    pub user_growth: Decimal,
}

impl UserStats {
    /// Combine the three counts and derive growth.
    ///
    /// A previous month without sign-ups always reports 100% growth, even
    /// when the current month is empty too.
    ///
    /// # Examples
    /// ```
    /// use rust_decimal::Decimal;
    /// use storefront::domain::UserStats;
    ///
    /// assert_eq!(UserStats::new(0, 0, 0).user_growth, Decimal::ONE_HUNDRED);
    /// assert_eq!(UserStats::new(9, 3, 2).user_growth, Decimal::from(50));
    /// ```
    pub fn new(total_users: u64, new_users_this_month: u64, new_users_last_month: u64) -> Self {
        let user_growth = if new_users_last_month == 0 {
            Decimal::ONE_HUNDRED
        } else {
            growth_percentage(
                Decimal::from(new_users_this_month),
                Decimal::from(new_users_last_month),
            )
        };
        Self {
            total_users,
            new_users_this_month,
            new_users_last_month,
            user_growth,
        }
    }
}
