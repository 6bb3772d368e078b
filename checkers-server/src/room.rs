//! 房间系统
//!
//! 每个房间由一把互斥锁保护，加入、走棋、离开、查询以及广播都在锁内完成，
//! 保证同一房间内的状态变化按全序发生。注册表使用单独的锁，
//! 只在查找、插入、删除映射时短暂持有，不会与房间锁嵌套。
//!
//! 每个连接的发送队列有固定容量，队列满或写端已关闭都按断线处理，
//! 移除后剩余玩家收到与主动离开相同的人数更新。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use protocol::{
    BoardState, GameError, Move, MoveOutcome, ParticipantId, Player, RoomId, Rules,
    ServerMessage, MAX_PLAYERS,
};

/// 发送队列容量
pub const OUTBOX_CAPACITY: usize = 64;

/// 连接的发送队列，由连接的写任务消费
pub type Outbox = mpsc::Sender<ServerMessage>;

/// 房间内的一个连接
struct Participant {
    player: Player,
    outbox: Outbox,
}

/// 房间人数快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStatus {
    pub count: usize,
    pub ready: bool,
}

impl From<RoomStatus> for ServerMessage {
    fn from(status: RoomStatus) -> Self {
        ServerMessage::players_update(status.count)
    }
}

/// 锁内状态
struct RoomInner {
    state: BoardState,
    /// 按连接 ID 排序，广播顺序稳定
    participants: BTreeMap<ParticipantId, Participant>,
}

impl RoomInner {
    fn occupied(&self, player: Player) -> bool {
        self.participants.values().any(|p| p.player == player)
    }

    fn status(&self) -> RoomStatus {
        let count = self.participants.len();
        RoomStatus {
            count,
            ready: count == MAX_PLAYERS,
        }
    }

    /// 移除连接；若其持有当前回合，回合无条件交给对方
    fn remove(&mut self, id: ParticipantId) -> Option<Player> {
        let participant = self.participants.remove(&id)?;
        if participant.player == self.state.current_turn {
            self.state.switch_turn();
        }
        Some(participant.player)
    }
}

/// 房间
pub struct Room {
    id: RoomId,
    /// 最后一名玩家离开后置位，之后的加入会被拒绝并重新查找
    closed: AtomicBool,
    inner: Mutex<RoomInner>,
}

impl Room {
    /// 创建新房间
    pub fn new(id: RoomId) -> Self {
        Self::with_state(id, BoardState::initial())
    }

    /// 以指定局面创建房间
    pub fn with_state(id: RoomId, state: BoardState) -> Self {
        Self {
            id,
            closed: AtomicBool::new(false),
            inner: Mutex::new(RoomInner {
                state,
                participants: BTreeMap::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 加入房间
    ///
    /// 分配空闲的玩家身份（先手优先），向加入者发送 `connection_ack`；
    /// 人数达到 2 时向双方发送 `game_start`。
    pub async fn join(&self, id: ParticipantId, outbox: Outbox) -> Result<Player, GameError> {
        let mut inner = self.inner.lock().await;

        self.prune(&mut inner);
        if self.is_closed() {
            return Err(GameError::RoomClosed);
        }
        if inner.participants.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }

        let player = if inner.occupied(Player::First) {
            Player::Second
        } else {
            Player::First
        };
        inner.participants.insert(id, Participant { player, outbox });

        let status = inner.status();
        info!(room = %self.id, participant = id, %player, count = status.count, "玩家加入房间");

        let ack = ServerMessage::ConnectionAck {
            your_player_number: player,
            total_players: status.count,
            game_ready: status.ready,
            current_player: inner.state.current_turn,
            board: inner.state.board.clone(),
        };
        self.deliver(&mut inner, |pid, _| (pid == id).then(|| ack.clone()));

        if status.ready {
            let current = inner.state.current_turn;
            self.deliver(&mut inner, |_, p| Some(ServerMessage::game_start(p.player == current)));
        }

        Ok(player)
    }

    /// 提交走法
    ///
    /// 依次检查：是否在房间中、是否轮到该玩家、起点棋子归属，再交给规则引擎。
    /// 任何失败都不修改状态也不广播。
    pub async fn submit_move(&self, id: ParticipantId, mv: Move) -> Result<MoveOutcome, GameError> {
        let mut inner = self.inner.lock().await;
        self.prune(&mut inner);

        let player = inner
            .participants
            .get(&id)
            .map(|p| p.player)
            .ok_or(GameError::NotInRoom)?;

        if player != inner.state.current_turn {
            return Err(GameError::NotYourTurn);
        }

        // 越界起点交给规则引擎报告为无效走法
        if mv.from.is_valid() && inner.state.board.get(mv.from).owner() != Some(player) {
            return Err(GameError::WrongPieceOwnership);
        }

        let outcome = Rules::apply(&mut inner.state, player, &mv)?;
        info!(
            room = %self.id,
            %player,
            %mv,
            captures = outcome.captures.len(),
            promoted = outcome.promoted,
            "走棋"
        );

        let update = ServerMessage::update(
            inner.state.board.clone(),
            inner.state.current_turn,
            &outcome.captures,
            player,
        );
        self.deliver(&mut inner, |_, _| Some(update.clone()));

        Ok(outcome)
    }

    /// 离开房间
    ///
    /// 返回离开者的身份；连接不在房间中时返回 None。
    /// 房间变空时标记为关闭，否则向剩余玩家广播人数。
    pub async fn leave(&self, id: ParticipantId) -> Option<Player> {
        let mut inner = self.inner.lock().await;

        let player = inner.remove(id)?;
        let status = inner.status();
        info!(room = %self.id, participant = id, %player, remaining = status.count, "玩家离开房间");

        if status.count == 0 {
            self.closed.store(true, Ordering::SeqCst);
        } else {
            self.deliver(&mut inner, |_, _| Some(status.into()));
        }

        Some(player)
    }

    /// 查询房间人数，只计入写端仍有效的连接
    pub async fn status(&self) -> RoomStatus {
        let mut inner = self.inner.lock().await;
        self.prune(&mut inner);
        inner.status()
    }

    /// 当前局面快照
    pub async fn snapshot(&self) -> BoardState {
        self.inner.lock().await.state.clone()
    }

    /// 移除写端已关闭的连接（在房间锁内调用）
    fn prune(&self, inner: &mut RoomInner) {
        let closed: Vec<ParticipantId> = inner
            .participants
            .iter()
            .filter(|(_, p)| p.outbox.is_closed())
            .map(|(&pid, _)| pid)
            .collect();
        if !closed.is_empty() {
            self.drop_participants(inner, closed);
        }
    }

    /// 向房间内的连接投递消息（在房间锁内调用）
    fn deliver<F>(&self, inner: &mut RoomInner, mut build: F)
    where
        F: FnMut(ParticipantId, &Participant) -> Option<ServerMessage>,
    {
        let batch = inner
            .participants
            .iter()
            .filter_map(|(&pid, participant)| build(pid, participant).map(|msg| (pid, msg)))
            .collect();
        self.dispatch(inner, batch);
    }

    /// 发送一批消息；失败的连接按断线移除，不重试
    fn dispatch(&self, inner: &mut RoomInner, batch: Vec<(ParticipantId, ServerMessage)>) {
        let dead: Vec<ParticipantId> = batch
            .into_iter()
            .filter_map(|(pid, msg)| {
                let participant = inner.participants.get(&pid)?;
                match participant.outbox.try_send(msg) {
                    Ok(()) => None,
                    Err(TrySendError::Full(_)) => {
                        warn!(room = %self.id, participant = pid, "发送队列已满");
                        Some(pid)
                    }
                    Err(TrySendError::Closed(_)) => Some(pid),
                }
            })
            .collect();

        if !dead.is_empty() {
            self.drop_participants(inner, dead);
        }
    }

    /// 按断线移除连接，并向剩余玩家广播人数
    fn drop_participants(&self, inner: &mut RoomInner, ids: Vec<ParticipantId>) {
        for pid in ids {
            if let Some(player) = inner.remove(pid) {
                warn!(room = %self.id, participant = pid, %player, "连接失效，移除");
            }
        }

        let status = inner.status();
        if status.count == 0 {
            self.closed.store(true, Ordering::SeqCst);
            return;
        }

        let batch = inner
            .participants
            .keys()
            .map(|&pid| (pid, ServerMessage::from(status)))
            .collect();
        self.dispatch(inner, batch);
    }
}

/// 房间注册表
///
/// 房间在第一次加入时创建，最后一名玩家离开时移除。
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, Arc<Room>>>,
    next_participant: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            next_participant: AtomicU64::new(1),
        }
    }

    /// 生成新的连接 ID
    pub fn next_participant_id(&self) -> ParticipantId {
        self.next_participant.fetch_add(1, Ordering::SeqCst)
    }

    /// 查找房间，不存在或已关闭时创建新房间
    pub async fn get_or_create(&self, room_id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;

        if let Some(room) = rooms.get(room_id) {
            if !room.is_closed() {
                return Arc::clone(room);
            }
        }

        let room = Arc::new(Room::new(room_id.to_string()));
        rooms.insert(room_id.to_string(), Arc::clone(&room));
        info!(room = room_id, "创建房间");
        room
    }

    /// 获取房间
    pub async fn get(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    /// 获取房间数量
    pub async fn count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// 加入指定房间，成功后返回座位
    ///
    /// 与房间销毁竞争时（拿到的房间已关闭）重新查找。
    pub async fn join(
        self: &Arc<Self>,
        room_id: &str,
        participant: ParticipantId,
        outbox: Outbox,
    ) -> Result<Seat, GameError> {
        loop {
            let room = self.get_or_create(room_id).await;
            match room.join(participant, outbox.clone()).await {
                Ok(player) => {
                    // 投递确认时加入者自己的写端可能已失效
                    self.discard_if_closed(&room).await;
                    return Ok(Seat {
                        registry: Arc::clone(self),
                        room,
                        participant,
                        player,
                        active: true,
                    });
                }
                Err(GameError::RoomClosed) => {
                    debug!(room = room_id, "房间已关闭，重新查找");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// 让连接离开房间，房间关闭后从注册表移除
    async fn release(&self, room: &Arc<Room>, participant: ParticipantId) {
        room.leave(participant).await;
        self.discard_if_closed(room).await;
    }

    /// 房间已关闭时从注册表移除（只移除同一个房间实例）
    async fn discard_if_closed(&self, room: &Arc<Room>) {
        if !room.is_closed() {
            return;
        }
        let mut rooms = self.rooms.lock().await;
        if rooms.get(room.id()).is_some_and(|r| Arc::ptr_eq(r, room)) {
            rooms.remove(room.id());
            info!(room = room.id(), "销毁房间");
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 座位：一次成功加入的凭证
///
/// `leave` 消耗座位，保证每个连接只离开一次；
/// 未调用 `leave` 就被丢弃（任务取消或 panic）时，在运行时上补发离开。
pub struct Seat {
    registry: Arc<RoomRegistry>,
    room: Arc<Room>,
    participant: ParticipantId,
    player: Player,
    active: bool,
}

impl Seat {
    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn player(&self) -> Player {
        self.player
    }

    /// 在所在房间走棋；广播中所有连接都失效时同时销毁房间
    pub async fn submit_move(&self, mv: Move) -> Result<MoveOutcome, GameError> {
        let result = self.room.submit_move(self.participant, mv).await;
        self.registry.discard_if_closed(&self.room).await;
        result
    }

    /// 离开房间
    pub async fn leave(mut self) {
        self.active = false;
        self.registry.release(&self.room, self.participant).await;
    }
}

impl Drop for Seat {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let registry = Arc::clone(&self.registry);
        let room = Arc::clone(&self.room);
        let participant = self.participant;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    registry.release(&room, participant).await;
                });
            }
            Err(_) => warn!(room = room.id(), participant, "运行时已关闭，无法释放座位"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Board, MoveError, Piece, Position};

    fn channel() -> (Outbox, mpsc::Receiver<ServerMessage>) {
        mpsc::channel(OUTBOX_CAPACITY)
    }

    fn mv(from: (i32, i32), to: (i32, i32)) -> Move {
        Move::new(Position::new(from.0, from.1), Position::new(to.0, to.1))
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// 创建一个已有两名玩家的房间
    async fn full_room() -> (
        Room,
        mpsc::Receiver<ServerMessage>,
        mpsc::Receiver<ServerMessage>,
    ) {
        let room = Room::new("test".to_string());
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        room.join(1, tx1).await.unwrap();
        room.join(2, tx2).await.unwrap();
        drain(&mut rx1);
        drain(&mut rx2);
        (room, rx1, rx2)
    }

    #[tokio::test]
    async fn test_join_assigns_players() {
        let room = Room::new("test".to_string());
        let (tx1, mut rx1) = channel();
        let (tx2, _rx2) = channel();
        let (tx3, mut rx3) = channel();

        assert_eq!(room.join(1, tx1).await, Ok(Player::First));
        assert_eq!(room.join(2, tx2).await, Ok(Player::Second));

        // 第三个玩家无法加入，也收不到任何消息
        assert_eq!(room.join(3, tx3).await, Err(GameError::RoomFull));
        assert!(drain(&mut rx3).is_empty());
        assert_eq!(room.status().await, RoomStatus { count: 2, ready: true });

        let messages = drain(&mut rx1);
        assert!(matches!(
            messages[0],
            ServerMessage::ConnectionAck {
                your_player_number: Player::First,
                total_players: 1,
                game_ready: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_game_start_notifies_both() {
        let room = Room::new("test".to_string());
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        room.join(1, tx1).await.unwrap();
        room.join(2, tx2).await.unwrap();

        let first = drain(&mut rx1);
        assert_eq!(first.len(), 2);
        assert_eq!(first[1], ServerMessage::game_start(true));

        let second = drain(&mut rx2);
        assert!(matches!(
            second[0],
            ServerMessage::ConnectionAck {
                your_player_number: Player::Second,
                total_players: 2,
                game_ready: true,
                current_player: Player::First,
                ..
            }
        ));
        assert_eq!(second[1], ServerMessage::game_start(false));
    }

    #[tokio::test]
    async fn test_move_broadcasts_update() {
        let (room, mut rx1, mut rx2) = full_room().await;

        room.submit_move(1, mv((1, 2), (0, 3))).await.unwrap();

        let state = room.snapshot().await;
        assert_eq!(state.board.get(Position::new(0, 3)), Piece::BlackMan);
        assert_eq!(state.board.get(Position::new(1, 2)), Piece::Empty);
        assert_eq!(state.current_turn, Player::Second);

        for rx in [&mut rx1, &mut rx2] {
            let messages = drain(rx);
            assert_eq!(messages.len(), 1);
            assert!(matches!(
                &messages[0],
                ServerMessage::Update { current_player: Player::Second, captures, .. } if captures.is_empty()
            ));
        }
    }

    #[tokio::test]
    async fn test_not_your_turn() {
        let (room, mut rx1, mut rx2) = full_room().await;
        let before = room.snapshot().await;

        assert_eq!(
            room.submit_move(2, mv((0, 5), (1, 4))).await,
            Err(GameError::NotYourTurn)
        );

        assert_eq!(room.snapshot().await, before);
        assert!(drain(&mut rx1).is_empty());
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_wrong_piece_and_invalid_move() {
        let (room, _rx1, _rx2) = full_room().await;
        let before = room.snapshot().await;

        // 移动对方棋子
        assert_eq!(
            room.submit_move(1, mv((0, 5), (1, 4))).await,
            Err(GameError::WrongPieceOwnership)
        );
        // 后退/直走
        assert_eq!(
            room.submit_move(1, mv((1, 2), (1, 3))).await,
            Err(GameError::InvalidMove(MoveError::NotDiagonal {
                from: Position::new(1, 2),
                to: Position::new(1, 3),
            }))
        );
        // 越界起点
        assert!(matches!(
            room.submit_move(1, mv((-1, 2), (0, 3))).await,
            Err(GameError::InvalidMove(MoveError::OutOfBoard(_)))
        ));
        // 不在房间中的连接
        assert_eq!(
            room.submit_move(99, mv((1, 2), (0, 3))).await,
            Err(GameError::NotInRoom)
        );

        assert_eq!(room.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_capture_reports_single_cell() {
        let mut board = Board::empty();
        board.set(Position::new(2, 3), Piece::BlackMan);
        board.set(Position::new(3, 4), Piece::WhiteMan);
        board.set(Position::new(7, 6), Piece::WhiteMan);
        let room = Room::with_state("test".to_string(), BoardState::from_board(board, Player::First));
        let (tx1, mut rx1) = channel();
        let (tx2, _rx2) = channel();
        room.join(1, tx1).await.unwrap();
        room.join(2, tx2).await.unwrap();
        drain(&mut rx1);

        let outcome = room.submit_move(1, mv((2, 3), (4, 5))).await.unwrap();
        assert_eq!(outcome.captures, vec![Position::new(3, 4)]);

        let messages = drain(&mut rx1);
        assert!(matches!(
            &messages[0],
            ServerMessage::Update { captures, winner: None, .. } if captures == &vec![[3, 4]]
        ));
    }

    #[tokio::test]
    async fn test_leave_transfers_turn() {
        let (room, _rx1, mut rx2) = full_room().await;

        // 先手持有回合时离开，回合交给后手
        assert_eq!(room.leave(1).await, Some(Player::First));
        assert_eq!(room.snapshot().await.current_turn, Player::Second);
        assert!(!room.is_closed());
        assert_eq!(drain(&mut rx2), vec![ServerMessage::players_update(1)]);

        // 重复离开无效果
        assert_eq!(room.leave(1).await, None);

        // 新加入者拿到空出的先手身份
        let (tx3, _rx3) = channel();
        assert_eq!(room.join(3, tx3).await, Ok(Player::First));
    }

    #[tokio::test]
    async fn test_leave_without_turn_keeps_turn() {
        let (room, _rx1, _rx2) = full_room().await;

        room.leave(2).await;
        assert_eq!(room.snapshot().await.current_turn, Player::First);
    }

    #[tokio::test]
    async fn test_dead_outbox_is_removed() {
        let (room, mut rx1, rx2) = full_room().await;
        drop(rx2);

        room.submit_move(1, mv((1, 2), (0, 3))).await.unwrap();

        // 后手写端已失效，走棋前按断线移除；先手看到的人数和回合与服务端一致
        let state = room.snapshot().await;
        assert_eq!(room.status().await, RoomStatus { count: 1, ready: false });
        assert_eq!(state.current_turn, Player::Second);

        let messages = drain(&mut rx1);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ServerMessage::players_update(1));
        assert!(matches!(
            &messages[1],
            ServerMessage::Update { current_player, .. } if *current_player == state.current_turn
        ));
    }

    #[tokio::test]
    async fn test_full_outbox_is_removed() {
        let room = Room::new("test".to_string());
        // 容量为 1，确认消息之后再无空间
        let (tx1, _rx1) = mpsc::channel(1);
        let (tx2, mut rx2) = channel();
        room.join(1, tx1).await.unwrap();
        room.join(2, tx2).await.unwrap();

        // 先手在发送开局消息时被移除，回合交给后手，后手收到人数更新
        assert_eq!(room.status().await, RoomStatus { count: 1, ready: false });
        assert_eq!(room.snapshot().await.current_turn, Player::Second);

        let messages = drain(&mut rx2);
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ServerMessage::ConnectionAck { .. }));
        assert_eq!(messages[1], ServerMessage::game_start(false));
        assert_eq!(messages[2], ServerMessage::players_update(1));
    }

    #[tokio::test]
    async fn test_join_skips_closed_outbox() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx1, rx1) = channel();
        let stale = registry.join("lobby", 1, tx1).await.unwrap();
        drop(rx1);

        // 唯一的玩家已失效：旧房间在加入时被清空并关闭，新玩家进入新房间拿到先手
        let (tx2, mut rx2) = channel();
        let seat = registry.join("lobby", 2, tx2).await.unwrap();
        assert_eq!(seat.player(), Player::First);
        assert!(stale.room().is_closed());
        assert!(!Arc::ptr_eq(seat.room(), stale.room()));

        let messages = drain(&mut rx2);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            ServerMessage::ConnectionAck { total_players: 1, game_ready: false, .. }
        ));

        stale.leave().await;
        assert!(Arc::ptr_eq(&registry.get("lobby").await.unwrap(), seat.room()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_moves_apply_once() {
        let (room, _rx1, mut rx2) = full_room().await;
        let room = Arc::new(room);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let room = Arc::clone(&room);
                tokio::spawn(async move { room.submit_move(1, mv((1, 2), (0, 3))).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.contains(&Err(GameError::NotYourTurn)));

        let state = room.snapshot().await;
        assert_eq!(state.current_turn, Player::Second);
        assert_eq!(state.board.get(Position::new(0, 3)), Piece::BlackMan);
        assert_eq!(state.board.get(Position::new(1, 2)), Piece::Empty);
        assert_eq!(state.board.count(Player::First), 12);

        let updates = drain(&mut rx2);
        assert_eq!(updates.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_fill_two_seats() {
        let room = Arc::new(Room::new("test".to_string()));
        let mut receivers = Vec::new();

        let handles: Vec<_> = (1..=3)
            .map(|id| {
                let (tx, rx) = channel();
                receivers.push(rx);
                let room = Arc::clone(&room);
                tokio::spawn(async move { room.join(id, tx).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| **r == Err(GameError::RoomFull)).count(), 1);
        assert!(results.contains(&Ok(Player::First)));
        assert!(results.contains(&Ok(Player::Second)));
        assert_eq!(room.status().await, RoomStatus { count: 2, ready: true });
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        let seat1 = registry.join("lobby", 1, tx1).await.unwrap();
        let seat2 = registry.join("lobby", 2, tx2).await.unwrap();
        assert_eq!(seat1.player(), Player::First);
        assert_eq!(seat2.player(), Player::Second);
        assert_eq!(registry.count().await, 1);

        let (tx3, _rx3) = channel();
        assert!(matches!(
            registry.join("lobby", 3, tx3).await,
            Err(GameError::RoomFull)
        ));

        seat1.leave().await;
        assert!(registry.get("lobby").await.is_some());

        seat2.leave().await;
        assert!(registry.get("lobby").await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_registry_isolates_rooms() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        let a = registry.join("a", 1, tx1).await.unwrap();
        let b = registry.join("b", 2, tx2).await.unwrap();

        assert_eq!(a.player(), Player::First);
        assert_eq!(b.player(), Player::First);
        assert!(!Arc::ptr_eq(a.room(), b.room()));
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_closed_room_is_replaced() {
        let registry = Arc::new(RoomRegistry::new());
        let stale = registry.get_or_create("lobby").await;
        let (tx1, _rx1) = channel();
        stale.join(1, tx1).await.unwrap();
        stale.leave(1).await;
        assert!(stale.is_closed());

        // 已关闭的房间拒绝加入，注册表换成新房间
        let (tx2, _rx2) = channel();
        assert_eq!(stale.join(2, tx2.clone()).await, Err(GameError::RoomClosed));

        let seat = registry.join("lobby", 2, tx2).await.unwrap();
        assert!(!Arc::ptr_eq(seat.room(), &stale));
        assert_eq!(seat.player(), Player::First);
    }

    #[tokio::test]
    async fn test_room_emptied_by_failed_ack_is_removed() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx1, rx1) = channel();
        drop(rx1);

        // 加入者自己的写端已失效：房间在加入时就变空，注册表同时移除
        let seat = registry.join("lobby", 1, tx1).await.unwrap();
        assert!(seat.room().is_closed());
        assert_eq!(registry.count().await, 0);

        seat.leave().await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_dropped_seat_leaves() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx1, _rx1) = channel();

        let seat = registry.join("lobby", 1, tx1).await.unwrap();
        drop(seat);

        // 等待补发的离开任务执行
        for _ in 0..100 {
            if registry.get("lobby").await.is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(registry.get("lobby").await.is_none());
    }
}
