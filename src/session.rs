// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/session.rs - 检测会话
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::detector::{Detection, Detector};
use crate::frame::Frame;

/// 会话可变状态，统一由一把锁保护。
/// generation 在每次 clear 时递增，迟到的流水线结果以此判废。
struct SessionState {
  current_frame: Option<Arc<Frame>>,
  results: Vec<Detection>,
  generation: u64,
}

struct Shared {
  state: Mutex<SessionState>,
  /// 单推理在途守卫，先行 CAS 抢占后才允许进入流水线
  busy: AtomicBool,
}

/// 在作用域结束时归还 busy 标志。
/// 只有代际未变时才归还，避免迟到的旧推理抢走新推理持有的标志。
struct BusyGuard {
  shared: Arc<Shared>,
  generation: u64,
}

impl Drop for BusyGuard {
  fn drop(&mut self) {
    let state = self.shared.state.lock().unwrap();
    if state.generation == self.generation {
      self.shared.busy.store(false, Ordering::SeqCst);
    }
  }
}

/// 检测会话，持有当前帧与当前检测结果，
/// 并保证同一时刻至多一个推理在途。
///
/// 克隆句柄共享同一份会话状态；
/// 实时流走 [`DetectionSession::submit_frame`]，
/// 相册单张走 [`DetectionSession::detect_once`]，两者共用同一条流水线。
#[derive(Clone)]
pub struct DetectionSession {
  detector: Option<Arc<Detector>>,
  shared: Arc<Shared>,
}

impl DetectionSession {
  pub fn new(detector: Arc<Detector>) -> Self {
    Self {
      detector: Some(detector),
      shared: Self::empty_shared(),
    }
  }

  /// 创建一个没有检测器的会话，用于模型加载失败后的降级运行：
  /// 每次调用都发布空结果并告警，绝不崩溃。
  pub fn detached() -> Self {
    Self {
      detector: None,
      shared: Self::empty_shared(),
    }
  }

  fn empty_shared() -> Arc<Shared> {
    Arc::new(Shared {
      state: Mutex::new(SessionState {
        current_frame: None,
        results: Vec::new(),
        generation: 0,
      }),
      busy: AtomicBool::new(false),
    })
  }

  /// 提交一帧实时画面。
  /// 已有推理在途时直接丢帧并返回 false，不排队也不重试；
  /// 否则存帧、后台跑流水线并发布结果，返回 true。
  pub fn submit_frame(&self, frame: Frame) -> bool {
    if !self.admit() {
      debug!("推理在途，丢弃本帧");
      return false;
    }

    let frame = Arc::new(frame.into_upright());
    let generation = self.store_frame(frame.clone());
    let guard = BusyGuard {
      shared: self.shared.clone(),
      generation,
    };

    let Some(detector) = self.detector.clone() else {
      warn!("检测器不可用，发布空结果");
      self.publish(generation, Vec::new());
      drop(guard);
      return true;
    };

    let shared = self.shared.clone();
    let spawned = thread::Builder::new()
      .name("xunlu-detect".to_string())
      .spawn(move || {
        let _guard = guard;
        let results = run_pipeline(&detector, &frame);
        publish_to(&shared, generation, results);
      });
    if let Err(e) = spawned {
      // 线程没起来，guard 已随闭包销毁并归还了 busy
      error!("检测线程创建失败: {}", e);
    }

    true
  }

  /// 对单张图片执行一次检测，在调用线程上同步完成。
  /// 推理在途时返回 None（本次请求被丢弃）；
  /// 流水线失败时返回 Some 空列表。
  pub fn detect_once(&self, frame: Frame) -> Option<Vec<Detection>> {
    if !self.admit() {
      debug!("推理在途，丢弃单次检测请求");
      return None;
    }

    let frame = Arc::new(frame.into_upright());
    let generation = self.store_frame(frame.clone());
    let _guard = BusyGuard {
      shared: self.shared.clone(),
      generation,
    };

    let results = match &self.detector {
      Some(detector) => run_pipeline(detector, &frame),
      None => {
        warn!("检测器不可用，发布空结果");
        Vec::new()
      }
    };

    self.publish(generation, results.clone());
    Some(results)
  }

  /// 只存帧不推理，用于提交前冻结实时画面
  pub fn set_frame_only(&self, frame: Frame) {
    let frame = Arc::new(frame.into_upright());
    let mut state = self.shared.state.lock().unwrap();
    state.current_frame = Some(frame);
  }

  /// 无条件复位：清空帧与结果并归还 busy 标志。
  /// 代际随之递增，在途推理的迟到结果与标志归还都会被判废。
  pub fn clear(&self) {
    let mut state = self.shared.state.lock().unwrap();
    Self::clear_locked(&mut state, &self.shared.busy);
  }

  /// 进入新一次上报流程时调用：
  /// 残留上次流程的帧或结果则复位，否则不做任何事
  pub fn prepare_for_new_session(&self) {
    let mut state = self.shared.state.lock().unwrap();
    if state.current_frame.is_some() || !state.results.is_empty() {
      debug!("检测到残留状态，复位会话");
      Self::clear_locked(&mut state, &self.shared.busy);
    }
  }

  pub fn results(&self) -> Vec<Detection> {
    self.shared.state.lock().unwrap().results.clone()
  }

  pub fn current_frame(&self) -> Option<Arc<Frame>> {
    self.shared.state.lock().unwrap().current_frame.clone()
  }

  pub fn is_busy(&self) -> bool {
    self.shared.busy.load(Ordering::SeqCst)
  }

  fn admit(&self) -> bool {
    self
      .shared
      .busy
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_ok()
  }

  /// 存入当前帧并返回本次推理所属的代际
  fn store_frame(&self, frame: Arc<Frame>) -> u64 {
    let mut state = self.shared.state.lock().unwrap();
    state.current_frame = Some(frame);
    state.generation
  }

  fn publish(&self, generation: u64, results: Vec<Detection>) {
    publish_to(&self.shared, generation, results);
  }

  fn clear_locked(state: &mut SessionState, busy: &AtomicBool) {
    state.generation += 1;
    state.current_frame = None;
    state.results.clear();
    busy.store(false, Ordering::SeqCst);
  }
}

/// 执行整条流水线并把一切失败吸收为空结果，绝不向上抛出
fn run_pipeline(detector: &Detector, frame: &Frame) -> Vec<Detection> {
  let now = Instant::now();
  match detector.detect(frame) {
    Ok(results) => {
      info!("检测完成: {} 个结果，耗时 {:.2?}", results.len(), now.elapsed());
      results
    }
    Err(e) => {
      error!("检测流水线失败: {}", e);
      Vec::new()
    }
  }
}

/// 代际相符才发布，clear 之后的迟到结果在此被丢弃
fn publish_to(shared: &Shared, generation: u64, results: Vec<Detection>) {
  let mut state = shared.state.lock().unwrap();
  if state.generation == generation {
    state.results = results;
  } else {
    debug!("结果所属代际已失效，丢弃");
  }
}
