//! Concrete servlets served by the dispatcher.
//!
//! Today that is a single [`jpeg::JpegServlet`] publishing one MJPEG video
//! track; further media types would become sibling modules implementing
//! [`crate::protocol::Servlet`].

pub mod jpeg;

pub use jpeg::JpegServlet;
