//! Entry points: wrapping drivers, connectors and connections.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::config::{Opt, Options};
use crate::conn::WrappedConn;
use crate::context::Context;
use crate::driver::{Conn, Connector, Driver};
use crate::observe::op;

/// An instrumented wrapper around a [`Driver`].
///
/// Every connection it opens is a [`WrappedConn`] sharing this driver's
/// [`Options`].
///
/// # Example
///
/// ```rust,ignore
/// use instrumented_sql::{wrap_driver, Opt};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let driver = wrap_driver(
///     MyDriver::default(),
///     [
///         Opt::OmitArgs,
///         Opt::TimeoutFunc(Arc::new(|| Duration::from_secs(5))),
///     ],
/// );
/// let conn = driver.open("postgres://localhost/mydb").await?;
/// ```
pub struct WrappedDriver {
    parent: Box<dyn Driver>,
    opts: Arc<Options>,
}

impl WrappedDriver {
    pub fn new(driver: impl Driver + 'static, opts: Options) -> Self {
        Self {
            parent: Box::new(driver),
            opts: Arc::new(opts),
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }
}

#[async_trait]
impl Driver for WrappedDriver {
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>, DbErr> {
        let conn = self.parent.open(name).await?;
        tracing::debug!(target: "instrumented_sql", "opened instrumented connection");
        Ok(Box::new(WrappedConn::new(conn, self.opts.clone())))
    }
}

/// An instrumented wrapper around a [`Connector`].
pub struct WrappedConnector {
    parent: Box<dyn Connector>,
    opts: Arc<Options>,
}

impl WrappedConnector {
    pub fn new(connector: impl Connector + 'static, opts: Options) -> Self {
        Self {
            parent: Box::new(connector),
            opts: Arc::new(opts),
        }
    }
}

#[async_trait]
impl Connector for WrappedConnector {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>, DbErr> {
        let opts = &self.opts;
        let conn = opts
            .observe(ctx, op::CONNECTOR_CONNECT, None, None, async {
                let scope = opts.set_timeout(ctx);
                self.parent.connect(&scope).await
            })
            .await?;

        Ok(Box::new(WrappedConn::new(conn, opts.clone())))
    }
}

/// Wrap `driver`, applying `opts` in order to a default [`Options`].
pub fn wrap_driver(driver: impl Driver + 'static, opts: impl IntoIterator<Item = Opt>) -> WrappedDriver {
    WrappedDriver::new(driver, opts.into_iter().collect())
}

/// Wrap `connector`, applying `opts` in order to a default [`Options`].
pub fn wrap_connector(
    connector: impl Connector + 'static,
    opts: impl IntoIterator<Item = Opt>,
) -> WrappedConnector {
    WrappedConnector::new(connector, opts.into_iter().collect())
}

/// Wrap an already open connection.
pub fn wrap_conn(conn: impl Conn + 'static, opts: impl IntoIterator<Item = Opt>) -> WrappedConn {
    WrappedConn::new(Box::new(conn), Arc::new(opts.into_iter().collect()))
}

/// Extension trait for easy wrapping of drivers.
pub trait InstrumentExt {
    /// Wrap this driver with default options.
    fn instrumented(self) -> WrappedDriver;

    /// Wrap this driver with the given options.
    fn instrumented_with(self, opts: Options) -> WrappedDriver;
}

impl<D: Driver + 'static> InstrumentExt for D {
    fn instrumented(self) -> WrappedDriver {
        WrappedDriver::new(self, Options::default())
    }

    fn instrumented_with(self, opts: Options) -> WrappedDriver {
        WrappedDriver::new(self, opts)
    }
}
