pub mod dispatch_detail;
pub mod dispatch_order;
pub mod dispatch_order_item;
pub mod dispatch_tracking_log;
pub mod element;
pub mod element_type;
pub mod end_client;
pub mod invoice;
pub mod invoice_item;
pub mod precast;
pub mod precast_stock;
pub mod session;
pub mod stock_approval_log;
pub mod stock_erected;
pub mod stock_erected_log;
pub mod user;
pub mod vehicle;
pub mod work_order;
pub mod work_order_attachment;
pub mod work_order_attachment_revision;
pub mod work_order_material;
pub mod work_order_material_revision;
pub mod work_order_revision;
