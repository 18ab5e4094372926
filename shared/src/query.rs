//! Daily min/max walk over the hourly series of a pair.

use crate::entity::{candles, exchanges, pairs};
use crate::models::{CandleFrequency, CurrencyPair, ExtremeKind, PairResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::stream::{self, Stream};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};

struct Walk {
    window_end: DateTime<Utc>,
    pending_max: Option<PairResult>,
    exhausted: bool,
}

/// Walk backwards one day at a time from `now`, yielding for each window the
/// hourly candle with the lowest low followed by the one with the highest high.
///
/// The sequence ends at the first window without a `min` row. A window that
/// yields a `min` but no `max` ends the sequence right after that `min`.
pub fn pair_extremes<'a, C>(
    db: &'a C,
    pair: CurrencyPair,
    now: DateTime<Utc>,
) -> impl Stream<Item = Result<PairResult, DbErr>> + 'a
where
    C: ConnectionTrait,
{
    let walk = Walk {
        window_end: now,
        pending_max: None,
        exhausted: false,
    };

    stream::try_unfold(walk, move |mut walk| async move {
        if let Some(max) = walk.pending_max.take() {
            return Ok(Some((max, walk)));
        }
        if walk.exhausted {
            return Ok(None);
        }

        let window_end = walk.window_end;
        let window_start = window_end - Duration::days(1);
        let window = (window_start.timestamp(), window_end.timestamp());

        let Some(min) = find_extreme(db, pair, window, ExtremeKind::Min).await? else {
            return Ok(None);
        };

        match find_extreme(db, pair, window, ExtremeKind::Max).await? {
            Some(max) => walk.pending_max = Some(max),
            None => walk.exhausted = true,
        }
        walk.window_end = window_start;
        Ok(Some((min, walk)))
    })
}

async fn find_extreme<C>(
    db: &C,
    pair: CurrencyPair,
    (start, end): (i64, i64),
    kind: ExtremeKind,
) -> Result<Option<PairResult>, DbErr>
where
    C: ConnectionTrait,
{
    let query = candles::Entity::find()
        .join(JoinType::InnerJoin, candles::Relation::Pairs.def())
        .find_also_related(exchanges::Entity)
        .filter(pairs::Column::Title.eq(pair.as_str()))
        .filter(candles::Column::Frequency.eq(CandleFrequency::Hour))
        .filter(candles::Column::Time.gte(start))
        .filter(candles::Column::Time.lt(end));

    let query = match kind {
        ExtremeKind::Min => query.order_by_asc(candles::Column::Low),
        ExtremeKind::Max => query.order_by_desc(candles::Column::High),
    }
    // ties go to the most recent candle
    .order_by_desc(candles::Column::Time);

    let Some((candle, exchange)) = query.one(db).await? else {
        return Ok(None);
    };
    let exchange = exchange
        .ok_or_else(|| DbErr::RecordNotFound(format!("exchange {}", candle.exchange_id)))?;

    let time = Utc
        .timestamp_opt(candle.time, 0)
        .single()
        .ok_or_else(|| DbErr::Type(format!("candle time out of range: {}", candle.time)))?;

    Ok(Some(PairResult {
        kind,
        time,
        close: candle.close,
        open: candle.open,
        high: candle.high,
        low: candle.low,
        volume: candle.volume,
        exchange: exchange.title,
    }))
}
