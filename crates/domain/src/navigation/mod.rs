//! Route table and navigation decisions

mod decision;
mod routes;

pub use decision::{NavigationDecision, Notice, NoticeLevel, NoticePosition};
pub use routes::{Route, RouteMeta, RouteName, RouteTable};
