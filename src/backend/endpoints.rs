//! Paths of the backend REST endpoints, relative to the configured base URL.

pub const USER_ME: &str = "/user/me";
pub const GENERAL_USERS: &str = "/general/users";

pub const RESTAURANT_CREATE: &str = "/restaurant/create";

pub const TABLES: &str = "/tables";
pub const TABLES_CREATE: &str = "/tables/create";

pub const RESTAURANT_USER_CREATE: &str = "/restaurantUser/create";
pub const RESTAURANT_USER_GET_ALL: &str = "/restaurantUser/getAll";

pub const ROLES_CREATE: &str = "/roles/create";
pub const ROLES_GET: &str = "/roles/getRoles";
pub const ROLES_UPDATE: &str = "/roles/update";
pub const ROLES_CHANGE: &str = "/roles/change";

pub const BOOKINGS_BOOK: &str = "/bookings/book";

pub const TIMESLOT_UPDATE_ONE: &str = "/timeslot/update-one";
pub const TIMESLOT_BATCH_UPDATE: &str = "/timeslot/batch-update";

pub const MENU_CREATE: &str = "/menu/create";
pub const MENU_UPDATE: &str = "/menu/update-menu";
pub const DISH_CREATE: &str = "/menu/dish/create";
pub const DISH_UPDATE: &str = "/menu/update-dish";

pub const ORDERS: &str = "/orders";
pub const ORDERS_CREATE: &str = "/orders/create";
pub const ORDERS_BOOKING_TOTAL: &str = "/orders/get-booking-total";
pub const ORDERS_UPDATE_ITEM_STATUS: &str = "/orders/update-item-status";

/// `/tables?restaurantId=N`
pub fn tables_of_restaurant(restaurant_id: i64) -> String {
    format!("{}?restaurantId={}", TABLES, restaurant_id)
}

/// `/tables/{id}`
pub fn table(table_id: i64) -> String {
    format!("{}/{}", TABLES, table_id)
}

pub fn restaurant_users(restaurant_id: i64) -> String {
    format!("{}/{}", RESTAURANT_USER_GET_ALL, restaurant_id)
}

pub fn restaurant_roles(restaurant_id: i64) -> String {
    format!("{}/{}", ROLES_GET, restaurant_id)
}

pub fn available_slots(restaurant_id: i64, date: &str) -> String {
    format!("/bookings/available?restaurantId={}&date={}", restaurant_id, date)
}

pub fn booking_timeslots(restaurant_id: i64, date: &str) -> String {
    format!("/bookings/timeslots?restaurantId={}&date={}", restaurant_id, date)
}

pub fn booked(restaurant_id: i64) -> String {
    format!("/bookings/booked?restaurantId={}", restaurant_id)
}

pub fn bookings_by_date(restaurant_id: i64, date: &str) -> String {
    format!("/bookings/by-date?restaurantId={}&date={}", restaurant_id, date)
}

/// `/timeslot/table/{id}/date/{date}`
pub fn table_time_slots(table_id: i64, date: &str) -> String {
    format!("/timeslot/table/{}/date/{}", table_id, date)
}

pub fn restaurant_menus(restaurant_id: i64) -> String {
    format!("/menu/getMenus?restaurantId={}", restaurant_id)
}

pub fn menu_dishes(restaurant_id: i64, menu_id: i64) -> String {
    format!(
        "/menu/getDishes?restaurantId={}&menuId={}",
        restaurant_id, menu_id
    )
}

pub fn orders_of_restaurant(restaurant_id: i64) -> String {
    format!("{}?restaurantId={}", ORDERS, restaurant_id)
}

pub fn order(order_id: i64) -> String {
    format!("{}/{}", ORDERS, order_id)
}

pub fn booking_orders(booking_id: i64) -> String {
    format!("{}/booking/{}", ORDERS, booking_id)
}
